// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command line front end

use crate::config::{AppConfig, ConfigError};
use crate::project_file::{ProjectDocument, ProjectFileError};
use crate::session::{EditorSession, SessionError};
use crate::sink::PngSequenceSink;
use cutline_render::SinkError;
use cutline_timeline::{ClipContent, Project};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Usage text
pub const USAGE: &str = "\
Usage: cutline <command> [options]

Commands:
  info <project>                          Print tracks and clips
  render <project> --time <s> --out <png> Render one frame
  export <project> --out <dir>            Export a PNG sequence
  new <project> [--width <px>] [--height <px>] [--fps <n>] [--duration <s>]
                                          Create an empty project

Options:
  --config <file.ron>  Settings file
  -h, --help           Show this help

Project files are read and written as .ron or .json.";

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Malformed arguments
    #[error("{0}")]
    Args(#[from] pico_args::Error),
    /// Unknown command or leftover arguments
    #[error("{0}")]
    Usage(String),
    /// Config file error
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Project file error
    #[error(transparent)]
    ProjectFile(#[from] ProjectFileError),
    /// Session error
    #[error(transparent)]
    Session(#[from] SessionError),
    /// Output error
    #[error(transparent)]
    Sink(#[from] SinkError),
    /// Image write error
    #[error("Failed to write image: {0}")]
    Image(#[from] image::ImageError),
}

/// A parsed subcommand
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Print usage
    Help,
    /// Print a project summary
    Info {
        /// Project file
        project: PathBuf,
    },
    /// Render one frame to a PNG
    Render {
        /// Project file
        project: PathBuf,
        /// Query time in seconds
        time: f64,
        /// Output image
        out: PathBuf,
    },
    /// Export every frame to a directory
    Export {
        /// Project file
        project: PathBuf,
        /// Output directory
        out: PathBuf,
    },
    /// Create an empty project file
    New {
        /// Project file to create
        project: PathBuf,
        /// Output width
        width: u32,
        /// Output height
        height: u32,
        /// Frame rate
        fps: f64,
        /// Duration in seconds
        duration: f64,
    },
}

/// Parsed command line
#[derive(Debug, Clone, PartialEq)]
pub struct Cli {
    /// What to do
    pub command: Command,
    /// Settings file
    pub config: Option<PathBuf>,
}

/// Parse arguments (without the program name)
pub fn parse_args(mut args: pico_args::Arguments) -> Result<Cli, CliError> {
    if args.contains(["-h", "--help"]) {
        return Ok(Cli {
            command: Command::Help,
            config: None,
        });
    }

    let subcommand = args.subcommand()?;
    let config = args.opt_value_from_str("--config")?;
    let command = match subcommand.as_deref() {
        Some("info") => Command::Info {
            project: args.free_from_str()?,
        },
        Some("render") => {
            let time = args.value_from_str("--time")?;
            let out = args.value_from_str("--out")?;
            Command::Render {
                project: args.free_from_str()?,
                time,
                out,
            }
        }
        Some("export") => {
            let out = args.value_from_str("--out")?;
            Command::Export {
                project: args.free_from_str()?,
                out,
            }
        }
        Some("new") => {
            let width = args.opt_value_from_str("--width")?.unwrap_or(1920);
            let height = args.opt_value_from_str("--height")?.unwrap_or(1080);
            let fps = args.opt_value_from_str("--fps")?.unwrap_or(30.0);
            let duration = args.opt_value_from_str("--duration")?.unwrap_or(10.0);
            Command::New {
                project: args.free_from_str()?,
                width,
                height,
                fps,
                duration,
            }
        }
        Some(other) => return Err(CliError::Usage(format!("Unknown command: {other}"))),
        None => return Err(CliError::Usage("Missing command".to_string())),
    };

    let rest = args.finish();
    if !rest.is_empty() {
        return Err(CliError::Usage(format!("Unexpected arguments: {rest:?}")));
    }
    Ok(Cli { command, config })
}

/// Human-readable project summary
pub fn describe(project: &Project) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: {}x{} @ {} fps, {:.2}s ({} frames)",
        project.name,
        project.width,
        project.height,
        project.fps,
        project.duration,
        cutline_render::frame_count(project.duration, project.fps),
    );
    for (index, track) in project.tracks().enumerate() {
        let mut flags = String::new();
        if track.muted {
            flags.push_str(" [muted]");
        }
        if track.solo {
            flags.push_str(" [solo]");
        }
        let _ = writeln!(out, "  #{index} {} ({}){flags}", track.name, track.kind.name());
        for clip in track.clips() {
            let detail = match &clip.content {
                ClipContent::Video { asset } | ClipContent::Image { asset } => asset.to_string(),
                ClipContent::Text(style) => format!("{:?}", style.content),
                ClipContent::Adjustment { tint } => tint.to_hex_rgb(),
            };
            let _ = writeln!(
                out,
                "    {:>8.3}s - {:>8.3}s  {} {} ({detail})",
                clip.start,
                clip.end(),
                clip.kind().name(),
                clip.name,
            );
        }
    }
    out
}

fn load_config(path: Option<&Path>) -> Result<AppConfig, CliError> {
    Ok(match path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    })
}

fn open_session(path: &Path, config: &AppConfig) -> Result<EditorSession, CliError> {
    let document = ProjectDocument::load(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(EditorSession::from_document(document, base_dir, config))
}

/// Run a parsed command
pub fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Help => println!("{USAGE}"),
        Command::Info { project } => {
            let document = ProjectDocument::load(&project)?;
            print!("{}", describe(&document.project));
        }
        Command::Render { project, time, out } => {
            let session = open_session(&project, &config)?;
            let surface = session.render_at(time)?;
            surface.as_image().save(&out)?;
            tracing::info!(time, out = %out.display(), "Rendered frame");
        }
        Command::Export { project, out } => {
            let session = open_session(&project, &config)?;
            let mut sink = PngSequenceSink::create(out, config.export.frame_prefix.clone())?;
            let summary = session.export(&mut sink)?;
            tracing::info!(
                frames = summary.frames,
                dir = %sink.dir().display(),
                "Export complete"
            );
        }
        Command::New {
            project,
            width,
            height,
            fps,
            duration,
        } => {
            let name = project
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("Untitled");
            let timeline = Project::new(name, width, height, fps).with_duration(duration);
            timeline
                .validate_settings()
                .map_err(ProjectFileError::from)?;
            ProjectDocument::new(timeline).save(&project)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetRecord;
    use cutline_timeline::{AssetId, Clip, Color, TextStyle, Track, TrackKind};
    use image::{Rgba, RgbaImage};
    use std::ffi::OsString;

    fn parse(args: &[&str]) -> Result<Cli, CliError> {
        parse_args(pico_args::Arguments::from_vec(
            args.iter().map(OsString::from).collect(),
        ))
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cutline_cli_{name}_{}", std::process::id()));
        std::fs::remove_dir_all(&dir).ok();
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse(&["render", "p.ron", "--time", "1.5", "--out", "f.png"]).unwrap(),
            Cli {
                command: Command::Render {
                    project: "p.ron".into(),
                    time: 1.5,
                    out: "f.png".into(),
                },
                config: None,
            }
        );
        let cli = parse(&["export", "--config", "c.ron", "p.json", "--out", "frames"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.ron")));
        assert!(matches!(cli.command, Command::Export { .. }));
        assert_eq!(parse(&["--help"]).unwrap().command, Command::Help);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse(&[]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["frobnicate"]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["render", "p.ron", "--out", "x.png"]), Err(CliError::Args(_))));
        assert!(matches!(parse(&["info", "a.ron", "b.ron"]), Err(CliError::Usage(_))));
    }

    #[test]
    fn test_describe() {
        let mut project = Project::new("Demo", 320, 240, 25.0).with_duration(2.0);
        let track = project.add_track(Track::new("Titles", TrackKind::Overlay)).unwrap();
        project.set_mute(track, true).unwrap();
        project
            .add_clip(track, Clip::text(TextStyle::new("Hi"), 0.5, 1.0))
            .unwrap();
        let text = describe(&project);
        assert!(text.starts_with("Demo: 320x240 @ 25 fps, 2.00s (50 frames)"));
        assert!(text.contains("#0 Titles (Overlay) [muted]"));
        assert!(text.contains("\"Hi\""));
    }

    #[test]
    fn test_new_then_export() {
        let dir = temp_dir("export");
        let project_path = dir.join("demo.ron");
        run(parse(&[
            "new",
            project_path.to_str().unwrap(),
            "--width",
            "8",
            "--height",
            "6",
            "--fps",
            "5",
            "--duration",
            "1",
        ])
        .unwrap())
        .unwrap();

        // Add a still image and an adjustment clip to the new project.
        RgbaImage::from_pixel(8, 6, Rgba([0, 200, 0, 255]))
            .save(dir.join("green.png"))
            .unwrap();
        let mut document = ProjectDocument::load(&project_path).unwrap();
        let track = document
            .project
            .add_track(Track::new("V1", TrackKind::Video))
            .unwrap();
        document
            .project
            .add_clip(track, Clip::image(AssetId::new("green"), 0.0, 0.6))
            .unwrap();
        let overlay = document
            .project
            .add_track(Track::new("FX", TrackKind::Overlay))
            .unwrap();
        document
            .project
            .add_clip(overlay, Clip::adjustment(Color::rgb(0, 0, 0), 0.8, 0.2))
            .unwrap();
        document.assets.push(AssetRecord::image("green", "green.png"));
        document.save(&project_path).unwrap();

        let out = dir.join("frames");
        run(parse(&["export", project_path.to_str().unwrap(), "--out", out.to_str().unwrap()]).unwrap()).unwrap();
        for index in 0..5 {
            assert!(out.join(format!("frame_{index:05}.png")).exists());
        }
        assert!(!out.join("frame_00005.png").exists());
        let first = image::open(out.join("frame_00000.png")).unwrap().to_rgba8();
        assert_eq!(first.get_pixel(4, 3).0, [0, 200, 0, 255]);

        let still = dir.join("still.png");
        run(parse(&[
            "render",
            project_path.to_str().unwrap(),
            "--time",
            "0.7",
            "--out",
            still.to_str().unwrap(),
        ])
        .unwrap())
        .unwrap();
        let frame = image::open(&still).unwrap().to_rgba8();
        assert_eq!(frame.get_pixel(0, 0).0, [0, 0, 0, 255]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_new_rejects_bad_settings() {
        let dir = temp_dir("bad");
        let path = dir.join("bad.json");
        let err = run(parse(&["new", path.to_str().unwrap(), "--fps", "0"]).unwrap()).unwrap_err();
        assert!(matches!(err, CliError::ProjectFile(ProjectFileError::Invalid(_))));
        assert!(!path.exists());
        std::fs::remove_dir_all(&dir).ok();
    }
}
