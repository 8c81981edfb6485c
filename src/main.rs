use std::io::{self, Write};
use std::path::PathBuf;

use log::Level;
use structopt::StructOpt;

use emlx2mbox::{trim_separators, Converter};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "emlx2mbox",
    about = "Convert folders of .emlx messages into mbox archives"
)]
struct Opt {
    #[structopt(parse(from_os_str), help = "Directory containing .mbox folders")]
    source: PathBuf,
    #[structopt(
        parse(from_os_str),
        default_value = "Converted",
        help = "Directory the archives are written to"
    )]
    dest: PathBuf,
    #[structopt(short = "v", long = "verbose", help = "Print some more information")]
    verbose: bool,
    #[structopt(short = "q", long = "quiet", help = "Do not print progress lines")]
    quiet: bool,
}

fn init_logger(opt: &Opt) {
    let filter = if opt.verbose {
        "emlx2mbox=debug"
    } else {
        "emlx2mbox=warn"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .target(env_logger::Target::Stdout)
        .format(|buf, record| match record.level() {
            Level::Error | Level::Warn => writeln!(buf, "  ** {}", record.args()),
            Level::Info => writeln!(buf, "{}", record.args()),
            _ => writeln!(buf, "  -- {}", record.args()),
        })
        .init();
}

fn main() -> io::Result<()> {
    let opt = Opt::from_args();
    init_logger(&opt);

    let source = trim_separators(&opt.source);
    let dest = trim_separators(&opt.dest);

    let converter = Converter::new(&source)?;
    let tally = if opt.quiet {
        converter.convert(&dest, &mut io::sink())
    } else {
        converter.convert(&dest, &mut io::stdout())
    };
    println!("{}", tally);
    Ok(())
}
