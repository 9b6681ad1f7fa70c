use anyhow::{bail, Context, Result};
use invite_harvester::config::Config;
use std::path::Path;

pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let toml_content = format!(
        "# invite-harvester configuration\n\n{}",
        Config::default().to_toml_string()?
    );

    std::fs::write(path, toml_content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Created configuration file: {}", path.display());

    Ok(())
}
