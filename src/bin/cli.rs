use boothcam::{BoothConfig, CameraBackend, CaptureKind, CaptureOutput};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    boothcam::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: boothcam-cli <capture|status> [--preview] [--config <path>] [--json]");
        std::process::exit(1);
    }

    let command = &args[1];
    match command.as_str() {
        "capture" => cmd_capture(&args).await,
        "status" => cmd_status(&args).await,
        _ => {
            eprintln!("Unknown command: {}", command);
            std::process::exit(1);
        }
    }
}

fn load_config(args: &[String]) -> Result<BoothConfig, Box<dyn std::error::Error>> {
    let config = match args.iter().position(|a| a == "--config") {
        Some(i) => {
            let path = args
                .get(i + 1)
                .ok_or("--config requires a path argument")?;
            BoothConfig::load_from_file(path)?
        }
        None => BoothConfig::load_or_default(),
    };
    config.validate()?;
    Ok(config)
}

async fn cmd_capture(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args)?;
    let json = args.contains(&"--json".to_string());
    let kind = if args.contains(&"--preview".to_string()) {
        CaptureKind::Preview
    } else {
        CaptureKind::Full
    };

    let camera = CameraBackend::from_config(&config);
    camera.initialize().await?;

    match camera.take_picture(kind).await {
        None => {
            eprintln!("a {} request is already pending", kind);
            std::process::exit(1);
        }
        Some(Err(e)) => {
            eprintln!("capture failed ({}): {}", e.status_code(), e);
            std::process::exit(1);
        }
        Some(Ok(CaptureOutput::Saved(photo))) => {
            if json {
                println!("{}", serde_json::to_string(&photo)?);
            } else {
                println!("{}", photo.path.display());
                println!("{}", photo.web_path);
            }
        }
        Some(Ok(CaptureOutput::Frame(frame))) => {
            if json {
                println!("{}", serde_json::json!({ "frame_bytes": frame.len() }));
            } else {
                println!("preview frame: {} bytes", frame.len());
            }
        }
    }
    Ok(())
}

async fn cmd_status(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args)?;
    let json = args.contains(&"--json".to_string());

    let camera = CameraBackend::from_config(&config);
    let initialized = match camera.initialize().await {
        Ok(()) => true,
        Err(e) => {
            log::warn!("initialize failed: {}", e);
            false
        }
    };
    let connected = camera.is_connected().await;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "backend": camera.kind(),
                "initialized": initialized,
                "connected": connected,
            })
        );
    } else {
        println!("backend: {:?}", camera.kind());
        println!("initialized: {}", initialized);
        println!("connected: {}", connected);
    }
    Ok(())
}
