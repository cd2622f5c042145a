use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use blog_archive::config::{read_config, Config};
use blog_archive::logger::default_log_location;

use crate::CFG_FILE_NAME;

fn get_config_path() -> Option<PathBuf> {
    let exe_dir = env::current_exe().ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()));
    let cur_dir = env::current_dir().ok();

    [exe_dir, cur_dir, dirs::config_dir()]
        .into_iter()
        .flatten()
        .map(|dir| dir.join(CFG_FILE_NAME))
        .find(|path| path.exists())
}

pub(crate) fn open_config(cfg_path: Option<PathBuf>) -> Result<Config> {
    let config_path = match cfg_path.or_else(get_config_path) {
        Some(path) => path,
        None => return Err(anyhow!("Could not find {}", CFG_FILE_NAME)),
    };

    let mut config = read_config(&config_path)
        .with_context(|| format!("Reading config from {}", config_path.display()))?;

    if let Some(ref mut log) = config.log {
        log.location = log.location.take().or_else(default_log_location);
        if let Some(ref location) = log.location {
            println!("Log enabled. Files will be written in {}", location.display());
        }
    }

    Ok(config)
}
