use super::{CliConfig, Command, Profile, MAX_CONNECT_TIMEOUT_MS};
use anyhow::{bail, Result};
use clap::Parser;

impl CliConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Merge the profile (if any), then check and normalise every value.
    pub fn validate(&mut self) -> Result<()> {
        if let Some(path) = self.profile.clone() {
            let profile = Profile::load(&path)?;
            self.apply_profile(profile);
        }

        let executable = match self.executable.as_deref().map(str::trim) {
            Some(exe) if !exe.is_empty() => exe.to_string(),
            Some(_) => bail!("--executable cannot be empty"),
            None => bail!("--executable is required (or set `executable` in the profile)"),
        };
        check_text("--executable", &executable)?;
        self.executable = Some(executable);

        if let Some(timeout) = self.connect_timeout_ms {
            if !(1..=MAX_CONNECT_TIMEOUT_MS).contains(&timeout) {
                bail!(
                    "--connect-timeout-ms must be between 1 and {MAX_CONNECT_TIMEOUT_MS}, got {timeout}"
                );
            }
        }

        if let Some(dir) = &self.pipe_dir {
            if !dir.is_dir() {
                bail!("--pipe-dir '{}' is not a directory", dir.display());
            }
        }

        match &self.command {
            Command::Train(args) => {
                if args.eval < -1 {
                    bail!("--eval must be -1 (disabled) or a method index, got {}", args.eval);
                }
                if args.kfolds == 0 {
                    bail!("--kfolds must be at least 1");
                }
                check_required("--pipeline", &args.pipeline)?;
                check_required("--traindef", &args.traindef)?;
                check_required("--training", &args.training)?;
                check_required("--trainer", &args.trainer)?;
                check_optional("--log", &args.log)?;
            }
            Command::Run(args) => {
                check_required("--pipeline", &args.pipeline)?;
                check_optional("--trainer", &args.trainer)?;
                check_optional("--signal", &args.signal)?;
                check_optional("--anno", &args.anno)?;
                check_optional("--user", &args.user)?;
                check_optional("--log", &args.log)?;
            }
        }
        Ok(())
    }

    fn apply_profile(&mut self, profile: Profile) {
        if self.executable.is_none() {
            self.executable = profile.executable;
        }
        if self.pipe_dir.is_none() {
            self.pipe_dir = profile.pipe_dir;
        }
        if self.connect_timeout_ms.is_none() {
            self.connect_timeout_ms = profile.connect_timeout_ms;
        }
        let log = match &mut self.command {
            Command::Train(args) => &mut args.log,
            Command::Run(args) => &mut args.log,
        };
        if log.is_none() {
            *log = profile.log;
        }
    }
}

fn check_required(flag: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("{flag} cannot be empty");
    }
    check_text(flag, value)
}

fn check_optional(flag: &str, value: &Option<String>) -> Result<()> {
    match value {
        Some(value) => check_text(flag, value),
        None => Ok(()),
    }
}

// The argument string is a single line handed to the child unescaped.
pub(super) fn check_text(flag: &str, value: &str) -> Result<()> {
    if value.contains(['\0', '\n', '\r']) {
        bail!("{flag} must not contain NUL bytes or line breaks");
    }
    Ok(())
}
