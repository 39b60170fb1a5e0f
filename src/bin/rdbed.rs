use eyre::{bail, Result};

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let settings_path = match (args.next(), args.next()) {
        (Some(path), None) => path,
        _ => bail!("Usage: rdbed <settings.toml>"),
    };

    let report = rdbed::entrypoints::run(settings_path)?;
    if let Some(assessment) = report.comparison {
        println!("{}", assessment.recommendation);
    }
    Ok(())
}
