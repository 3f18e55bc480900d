use anyhow::{bail, Context, Result};
use backgroundcam::config::ServiceConfig;
use backgroundcam::selector::{rank, AspectPolicy};
use backgroundcam::service::{Action, BackgroundCameraService, CameraService, ServiceEvent};
use backgroundcam::session::SessionState;
use backgroundcam::testing::{SimulatedCameraHost, SimulatedServiceHost};
use backgroundcam::types::Size;
use std::env;
use std::time::Duration;

const USAGE: &str = "Usage: backgroundcam-cli <command> [args]

Commands:
  select <WxH> <WxH,WxH,...> [--unnormalized] [--json]
  simulate [--preview] [--record] [--frames <n>] [--config <path>] [--json]
  config [<path>]";

#[tokio::main]
async fn main() -> Result<()> {
    backgroundcam::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    }

    let command = &args[1];
    match command.as_str() {
        "select" => cmd_select(&args),
        "simulate" => cmd_simulate(&args).await,
        "config" => cmd_config(&args),
        _ => {
            eprintln!("Unknown command: {}\n\n{}", command, USAGE);
            std::process::exit(1);
        }
    }
}

fn parse_sizes(list: &str) -> Result<Vec<Size>> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.trim()
                .parse::<Size>()
                .with_context(|| format!("invalid size '{}'", s))
        })
        .collect()
}

fn cmd_select(args: &[String]) -> Result<()> {
    let mut positional = Vec::new();
    let mut policy = AspectPolicy::Normalized;
    let mut json = false;

    for arg in &args[2..] {
        match arg.as_str() {
            "--unnormalized" => policy = AspectPolicy::Unnormalized,
            "--json" => json = true,
            _ => positional.push(arg.as_str()),
        }
    }

    let (target, candidates) = match positional.as_slice() {
        [target, candidates] => (
            target
                .parse::<Size>()
                .with_context(|| format!("invalid target '{}'", target))?,
            parse_sizes(candidates)?,
        ),
        [target] => (
            target
                .parse::<Size>()
                .with_context(|| format!("invalid target '{}'", target))?,
            Vec::new(),
        ),
        _ => bail!("Usage: backgroundcam-cli select <WxH> <WxH,WxH,...>"),
    };

    let ordered = rank(&candidates, target, policy);
    let chosen = backgroundcam::selector::select_with_policy(&candidates, target, policy);

    if json {
        println!(
            "{}",
            serde_json::to_string(&serde_json::json!({
                "target": target,
                "policy": policy,
                "selected": chosen,
                "ranking": ordered,
            }))?
        );
    } else {
        println!("Selected {} for target {} ({:?})", chosen, target, policy);
        for (i, size) in ordered.iter().enumerate() {
            println!("  {}. {}", i + 1, size);
        }
    }
    Ok(())
}

async fn cmd_simulate(args: &[String]) -> Result<()> {
    let mut preview = false;
    let mut record = false;
    let mut frames = 3u32;
    let mut json = false;
    let mut config = ServiceConfig::default();

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--preview" => preview = true,
            "--record" => record = true,
            "--json" => json = true,
            "--frames" => {
                i += 1;
                let value = args.get(i).context("--frames needs a value")?;
                frames = value.parse().context("--frames must be a number")?;
            }
            "--config" => {
                i += 1;
                let path = args.get(i).context("--config needs a path")?;
                config = ServiceConfig::load_from_file(path)?;
            }
            other => bail!("Unknown option: {}", other),
        }
        i += 1;
    }
    if record {
        config.recording.enabled = true;
    }

    let camera_host = SimulatedCameraHost::new();
    let sim = camera_host.controller();
    let service_host = SimulatedServiceHost::default().with_overlay_surface(Some(Size::new(1280, 720)));
    let camera = CameraService::spawn(camera_host, config.clone());
    let mut events = camera.subscribe();

    let mut service = BackgroundCameraService::new(Box::new(service_host), camera.clone(), config);
    service.on_create()?;
    let action = if preview {
        Action::StartWithPreview
    } else {
        Action::Start
    };
    service.on_start_command(action).await?;

    let reached = tokio::time::timeout(
        Duration::from_secs(2),
        camera.wait_for_state(|s| matches!(s, SessionState::Active | SessionState::Failed)),
    )
    .await
    .context("camera did not settle")??;
    if reached == SessionState::Active {
        for n in 0..frames {
            sim.emit_frame(1280, 720, i64::from(n) * 33_333_333);
        }
    }

    let status = camera.status();
    service.on_destroy().await?;
    camera.shutdown();

    let mut seen: Vec<ServiceEvent> = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }

    if json {
        println!(
            "{}",
            serde_json::to_string(&serde_json::json!({
                "status": status,
                "events": seen,
            }))?
        );
    } else {
        println!(
            "Session {} at {} ({} frames)",
            status.state,
            status
                .capture_size
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
            status.frames_delivered
        );
        if let Some(path) = &status.recording_path {
            println!("Recording: {}", path.display());
        }
        if let Some(error) = &status.last_error {
            println!("Error: {}", error);
        }
        for event in seen {
            println!("  {}", serde_json::to_string(&event)?);
        }
    }
    Ok(())
}

fn cmd_config(args: &[String]) -> Result<()> {
    let config = match args.get(2) {
        Some(path) => ServiceConfig::load_from_file(path)?,
        None => ServiceConfig::default(),
    };
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
