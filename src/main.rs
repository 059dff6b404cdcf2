//! Window-Occlusion: report how much of each window is actually visible
//!
//! Usage:
//!   window-occlusion                          list on-screen windows
//!   window-occlusion <id>                     details for one window
//!   window-occlusion --watch <id> [--interval-ms N]
//!   window-occlusion --render <id> <out.png>
//!
//! Set `RUST_LOG=debug` for per-calculation logging.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use thiserror::Error;

use window_occlusion::app::{watch_iter, WatchError};
use window_occlusion::platform::{self, ProviderError};
use window_occlusion::ui::{OcclusionRenderer, RendererError};
use window_occlusion::{
    OcclusionCalculator, OcclusionError, OcclusionOutcome, SurfaceDescriptor, SurfaceId,
    SurfaceQuery, WatchConfig,
};

const USAGE: &str = "\
usage: window-occlusion [<id> | --watch <id> [--interval-ms N] | --render <id> <out.png>]

Ids are window handles, decimal or 0x-prefixed hexadecimal.";

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Occlusion(#[from] OcclusionError),
    #[error(transparent)]
    Watch(#[from] WatchError),
    #[error(transparent)]
    Render(#[from] RendererError),
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    List,
    Show(SurfaceId),
    Watch { id: SurfaceId, interval: Duration },
    Render { id: SurfaceId, path: String },
}

fn parse_id(text: &str) -> Result<SurfaceId, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse::<u64>(),
    };
    parsed
        .map(SurfaceId)
        .map_err(|_| format!("invalid window id '{text}'"))
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    match args {
        [] => Ok(Command::List),
        [flag, id, rest @ ..] if flag == "--watch" => {
            let id = parse_id(id)?;
            let interval = match rest {
                [] => WatchConfig::DEFAULT_INTERVAL,
                [opt, ms] if opt == "--interval-ms" => ms
                    .parse::<u64>()
                    .map(Duration::from_millis)
                    .map_err(|_| format!("invalid interval '{ms}'"))?,
                _ => return Err("unexpected arguments after --watch <id>".to_string()),
            };
            Ok(Command::Watch { id, interval })
        }
        [flag, id, path] if flag == "--render" => Ok(Command::Render {
            id: parse_id(id)?,
            path: path.clone(),
        }),
        [id] if !id.starts_with("--") => Ok(Command::Show(parse_id(id)?)),
        _ => Err("unrecognised arguments".to_string()),
    }
}

fn print_summary(outcome: &OcclusionOutcome) {
    println!(
        "{:>12} {:>#10x} {:>7.2}% {:>3}  {}",
        outcome.target.id,
        outcome.target.id.0,
        outcome.coverage * 100.0,
        outcome.occluder_count(),
        outcome.target.display_name()
    );
}

fn print_details(outcome: &OcclusionOutcome) {
    let target = &outcome.target;
    let frame = target.frame;
    println!("Window {} ({:#x}): {}", target.id, target.id.0, target.display_name());
    println!(
        "  frame     {}x{} at ({}, {})",
        frame.w, frame.h, frame.x, frame.y
    );
    println!("  coverage  {:.2}%", outcome.coverage * 100.0);
    println!(
        "  visible   {:.2}% ({} px²)",
        outcome.visible_percentage() * 100.0,
        outcome.visible_area()
    );
    println!("  occluders {}", outcome.occluder_count());
    for occluder in &outcome.occluders {
        println!("    {:>12}  {}", occluder.id, occluder.display_name());
    }
    println!("  visible pieces {}", outcome.visible_rects.len());
    for rect in &outcome.visible_rects {
        println!("    {}x{} at ({}, {})", rect.w, rect.h, rect.x, rect.y);
    }
}

/// On-screen application windows with a usable frame
fn listed_windows() -> SurfaceQuery {
    SurfaceQuery::on_screen()
        .and(SurfaceQuery::custom(SurfaceDescriptor::is_normal_layer))
        .and(SurfaceQuery::min_area(1.0))
}

fn run(command: Command) -> Result<(), CliError> {
    let provider = platform::default_provider()?;
    let calculator = Arc::new(OcclusionCalculator::new(provider));

    match command {
        Command::List => {
            let windows = listed_windows();
            println!("{:>12} {:>10} {:>8} {:>3}  name", "id", "hwnd", "covered", "occ");
            for outcome in calculator.calculate_matching(&windows)? {
                print_summary(&outcome);
            }
        }
        Command::Show(id) => print_details(&calculator.calculate(id)?),
        Command::Watch { id, interval } => {
            let config = WatchConfig::default().with_interval(interval);
            for result in watch_iter(Arc::clone(&calculator), id, config)? {
                match result {
                    Ok(outcome) => print_summary(&outcome),
                    Err(OcclusionError::TargetNotFound { id }) => {
                        info!("Window {} closed, watch finished", id);
                        println!("Window {id} closed");
                        break;
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }
        Command::Render { id, path } => {
            let outcome = calculator.calculate(id)?;
            OcclusionRenderer::new().save_png(&outcome, 1.0, &path)?;
            println!("Wrote {path} ({:.2}% covered)", outcome.coverage * 100.0);
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{message}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    match run(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use window_occlusion::Rect;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn parses_ids() {
        assert_eq!(parse_id("42"), Ok(SurfaceId(42)));
        assert_eq!(parse_id("0x1F"), Ok(SurfaceId(31)));
        assert!(parse_id("window").is_err());
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_args(&args(&[])), Ok(Command::List));
        assert_eq!(parse_args(&args(&["7"])), Ok(Command::Show(SurfaceId(7))));
        assert_eq!(
            parse_args(&args(&["--watch", "7"])),
            Ok(Command::Watch {
                id: SurfaceId(7),
                interval: WatchConfig::DEFAULT_INTERVAL
            })
        );
        assert_eq!(
            parse_args(&args(&["--watch", "7", "--interval-ms", "100"])),
            Ok(Command::Watch {
                id: SurfaceId(7),
                interval: Duration::from_millis(100)
            })
        );
        assert_eq!(
            parse_args(&args(&["--render", "0x10", "out.png"])),
            Ok(Command::Render {
                id: SurfaceId(16),
                path: "out.png".to_string()
            })
        );
    }

    #[test]
    fn list_shows_on_screen_application_windows() {
        let frame = Rect::new(0.0, 0.0, 100.0, 100.0);
        let surfaces = vec![
            SurfaceDescriptor::new(1, frame),
            SurfaceDescriptor::new(2, frame).with_layer(1),
            SurfaceDescriptor::new(3, frame).with_on_screen(false),
            SurfaceDescriptor::new(4, Rect::new(0.0, 0.0, 0.0, 100.0)),
        ];
        let ids: Vec<u64> = listed_windows()
            .select(&surfaces)
            .into_iter()
            .map(|s| s.id.0)
            .collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(parse_args(&args(&["--watch"])).is_err());
        assert!(parse_args(&args(&["--watch", "7", "--interval-ms", "soon"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
        assert!(parse_args(&args(&["1", "2"])).is_err());
    }
}
