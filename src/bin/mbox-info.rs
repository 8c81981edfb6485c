use std::io;
use std::path::PathBuf;

use structopt::StructOpt;

use emlx2mbox::Mboxfile;

#[derive(Debug, StructOpt)]
#[structopt(name = "mbox-info", about = "Count the messages in a converted archive")]
struct Opt {
    #[structopt(parse(from_os_str))]
    path: PathBuf,
    #[structopt(short = "v", long = "verbose", help = "Print some more information")]
    verbose: bool,
}

fn main() -> io::Result<()> {
    let opt = Opt::from_args();
    let mbox = Mboxfile::from_file(&opt.path)?;

    let count = mbox
        .iter()
        .inspect(|entry| {
            if opt.verbose {
                println!("{:?}", entry);
            }
        })
        .count();
    println!("{}: {} messages", opt.path.display(), count);
    Ok(())
}
