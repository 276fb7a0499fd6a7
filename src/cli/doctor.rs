//! Doctor command - check environment

use anyhow::{bail, Result};
use gitgamer::config::UserConfig;
use gitgamer::git::{configured_identity, CommitIdentity, GitCli, FALLBACK_EMAIL, FALLBACK_NAME};

pub fn run(config: &UserConfig) -> Result<()> {
    println!("🩺 gitgamer Doctor\n");
    let mut healthy = true;

    // The commit driver shells out to git for every commit
    let cwd = std::env::current_dir()?;
    match GitCli::new(&cwd).version() {
        Ok(version) => println!("✓ git: {}", version),
        Err(err) => {
            healthy = false;
            println!("✗ git: {}", err);
            println!("  Install git and make sure it is on PATH");
        }
    }

    let (git_name, git_email) = configured_identity(&cwd);
    let identity = CommitIdentity::resolve(
        [config.author.name.clone(), git_name],
        [config.author.email.clone(), git_email],
    );
    if identity.name == FALLBACK_NAME || identity.email == FALLBACK_EMAIL {
        println!("○ Author: {} (placeholder)", identity);
        println!("  Pass --name/--email, set [author] in the config, or run `git config --global user.name ...`");
    } else {
        println!("✓ Author: {}", identity);
    }

    match UserConfig::user_config_path() {
        Some(path) if path.exists() => println!("✓ Config: {}", path.display()),
        Some(path) => println!("○ Config: none ({} not found, defaults in use)", path.display()),
        None => println!("○ Config: no config directory on this platform"),
    }

    if !healthy {
        bail!("Some checks failed");
    }
    println!("\n✅ All checks passed!");
    Ok(())
}
