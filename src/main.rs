use anyhow::Result;
use clap::Parser;

use dicom_relabel::cli::{normalize, Cli};
use dicom_relabel::{runner, util};

fn main() -> Result<()> {
  let cli = Cli::parse();

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  // Phase 1: logging, then normalize CLI
  util::init_logging(cli.verbose);
  let cfg = normalize(cli)?;

  // Phase 2: list, single run or interactive loop
  runner::process(&cfg)
}
