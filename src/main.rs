use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use log::{info, warn};

use iw_monitor_ctl::{
    ControlConfig, IwLink, IwLinkHandler, MonitorFlag, NlConnector, SysfsNetDev,
};

const USAGE: &str = "usage: iw-monitor-ctl [--config PATH] <command>

commands:
  chanlist <if>
  createvap <parent> <new>
  flags <if> [none|fcsfail|plcpfail|control|otherbss|cookframes ...]
  channel <if> <channel> [mode]
  hop <if> <dwell-ms>";

fn load_config(path: Option<PathBuf>) -> Result<ControlConfig> {
    let config = match path.or_else(ControlConfig::default_path) {
        Some(path) => ControlConfig::load_or_default(&path)?,
        None => ControlConfig::default(),
    };

    Ok(config)
}

fn arg<'a>(args: &'a [String], idx: usize, name: &str) -> Result<&'a str> {
    args.get(idx)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing <{}>\n{}", name, USAGE))
}

fn hop(iw_link: &IwLink<NlConnector, SysfsNetDev>, if_name: &str, dwell: Duration) -> Result<()> {
    let channels = iw_link.get_channel_list(if_name)?.into_channels();
    if channels.is_empty() {
        bail!("{} reports no usable channels", if_name);
    }

    info!("Hopping {} over {:?} every {:?}", if_name, channels, dwell);

    let mut session = iw_link.open_session(if_name)?;
    for channel in channels.iter().cycle() {
        if let Err(e) = iw_link.set_channel_with_session(&mut session, if_name, *channel, 0) {
            if !e.is_retryable() {
                return Err(e.into());
            }
            warn!("Channel {} failed, continuing: {}", channel, e);
        }
        thread::sleep(dwell);
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let mut config_path = None;
    if args.first().map(String::as_str) == Some("--config") {
        let path = arg(&args, 1, "PATH")?.to_string();
        config_path = Some(PathBuf::from(path));
        args.drain(..2);
    }

    let config = load_config(config_path)?;
    let netdev = SysfsNetDev::new(config.sysfs_net_root.clone());
    let iw_link = IwLink::with_config(NlConnector, netdev, config);

    let command = arg(&args, 0, "command")?;
    match command {
        "chanlist" => {
            let if_name = arg(&args, 1, "if")?;
            let block = iw_link.get_channel_list(if_name)?;
            let channels: Vec<String> =
                block.channels().iter().map(u32::to_string).collect();
            println!("{} ({}): {}", if_name, block.phy_name(), channels.join(" "));
        }
        "createvap" => {
            let parent = arg(&args, 1, "parent")?;
            let new_name = arg(&args, 2, "new")?;
            iw_link.create_vap(parent, new_name)?;
            println!("{} ready", new_name);
        }
        "flags" => {
            let if_name = arg(&args, 1, "if")?;
            let flags = if args.len() > 2 {
                args[2..]
                    .iter()
                    .map(|flag| flag.parse::<MonitorFlag>())
                    .collect::<iw_monitor_ctl::Result<Vec<_>>>()?
            } else {
                iw_link.config().monitor_flags.clone()
            };
            iw_link.set_monitor_flags(if_name, &flags)?;
        }
        "channel" => {
            let if_name = arg(&args, 1, "if")?;
            let channel: u32 = arg(&args, 2, "channel")?
                .parse()
                .context("channel must be a number")?;
            let mode: u32 = match args.get(3) {
                Some(mode) => mode.parse().context("mode must be 0-3")?,
                None => 0,
            };
            iw_link.set_channel(if_name, channel, mode)?;
        }
        "hop" => {
            let if_name = arg(&args, 1, "if")?;
            let dwell: u64 = arg(&args, 2, "dwell-ms")?
                .parse()
                .context("dwell must be a number of milliseconds")?;
            hop(&iw_link, if_name, Duration::from_millis(dwell))?;
        }
        other => bail!("unknown command {}\n{}", other, USAGE),
    }

    Ok(())
}
