// SPDX-License-Identifier: GPL-3.0-or-later
// src/cli.rs
//
// Command-line front end. Every subcommand drives the controller with messages.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};

use photofuse::app::{App, AppMessage, AppModel, Command, ToolMode, update};
use photofuse::client::FusionService;
use photofuse::client::gemini::GeminiClient;
use photofuse::config::AppConfig;
use photofuse::constant::{DIGEST_NAME_LEN, INITIAL_CROP};
use photofuse::domain::crop::AspectRatio;
use photofuse::domain::geometry::CropRect;
use photofuse::domain::mask::MASK_FILE_NAME;
use photofuse::domain::scenario::ScenarioList;
use photofuse::domain::upload::{ImageHandle, PhotoSlot};
use photofuse::storage::{LocalStorage, ScenarioStore};

// =============================================================================
// Arguments
// =============================================================================

/// Merge a person into a group photo with a hosted image model.
#[derive(Parser, Debug)]
#[command(name = "photofuse", version, about)]
pub struct CliArgs {
    /// Config file (defaults to the platform config directory).
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Insert the person from one photo into a group photo.
    Fuse {
        /// Photo of the person to insert.
        #[arg(long, value_name = "FILE")]
        person: PathBuf,
        /// Photo of the group.
        #[arg(long, value_name = "FILE")]
        group: PathBuf,
        /// Scenario key (see `scenarios list`). Defaults to the first one.
        #[arg(short, long)]
        scenario: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Crop a photo. Region values are percentages of the image size.
    Crop {
        input: PathBuf,
        #[arg(long, default_value_t = INITIAL_CROP.0)]
        x: f32,
        #[arg(long, default_value_t = INITIAL_CROP.1)]
        y: f32,
        #[arg(long, default_value_t = INITIAL_CROP.2)]
        width: f32,
        #[arg(long, default_value_t = INITIAL_CROP.3)]
        height: f32,
        /// free, 1:1, 4:3, 16:9, W:H or a decimal ratio.
        #[arg(short, long, default_value = "free")]
        aspect: AspectRatio,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Render a black and white mask from brush strokes.
    Mask {
        input: PathBuf,
        #[command(flatten)]
        strokes: StrokeArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Regenerate the masked area of an image from a text prompt.
    Inpaint {
        input: PathBuf,
        #[command(flatten)]
        strokes: StrokeArgs,
        /// What to generate in the masked area.
        #[arg(short, long)]
        prompt: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Manage the saved scenarios.
    #[command(subcommand)]
    Scenarios(ScenarioCommand),
}

#[derive(Subcommand, Debug)]
pub enum ScenarioCommand {
    List,
    Show {
        value: String,
    },
    Add {
        #[arg(short, long)]
        label: String,
        #[arg(short, long)]
        description: String,
    },
    Edit {
        value: String,
        #[arg(short, long)]
        label: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    Remove {
        value: String,
    },
    /// Drop all edits and go back to the built-in scenarios.
    Reset,
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Output file. Defaults to `<kind>-<digest>.png` in the output directory.
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<PathBuf>,
    /// Show the result in the system image viewer.
    #[arg(long)]
    pub open: bool,
}

#[derive(Args, Debug)]
pub struct StrokeArgs {
    /// JSON list of strokes, each a list of `[x, y]` points in image pixels.
    #[arg(long, value_name = "FILE")]
    pub strokes: PathBuf,
    /// Brush diameter in image pixels.
    #[arg(short, long)]
    pub brush: Option<f32>,
}

// =============================================================================
// Entry point
// =============================================================================

pub async fn run(args: CliArgs) -> anyhow::Result<()> {
    let config = AppConfig::load(args.config.as_deref());
    let store = ScenarioStore::new(LocalStorage::new(config.resolve_storage_path()));

    match args.command {
        CliCommand::Fuse {
            person,
            group,
            scenario,
            output,
        } => fuse(&config, store, &person, &group, scenario, &output).await,
        CliCommand::Crop {
            input,
            x,
            y,
            width,
            height,
            aspect,
            output,
        } => {
            let rect = CropRect::new(x, y, width, height);
            crop(&config, &input, rect, aspect, &output)
        }
        CliCommand::Mask {
            input,
            strokes,
            output,
        } => mask(&config, &input, &strokes, &output),
        CliCommand::Inpaint {
            input,
            strokes,
            prompt,
            output,
        } => inpaint(&config, store, &input, &strokes, prompt, &output).await,
        CliCommand::Scenarios(cmd) => scenarios(&config, &store, cmd),
    }
}

// =============================================================================
// Subcommands
// =============================================================================

async fn fuse(
    config: &AppConfig,
    store: ScenarioStore,
    person: &Path,
    group: &Path,
    scenario: Option<String>,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let mut app = App::new(config, FusionService::new(GeminiClient::new(config)?), store);

    for (slot, path) in [(PhotoSlot::Person, person), (PhotoSlot::Group, group)] {
        app.dispatch(AppMessage::Upload {
            slot,
            image: ImageHandle::from_path(path)?,
        })
        .await;
    }
    if let Some(value) = scenario {
        app.dispatch(AppMessage::SelectScenario(value)).await;
        check(&mut app.model)?;
    }

    log::info!("Using scenario \"{}\"", app.model.selected_scenario().label);
    app.dispatch(AppMessage::Generate).await;
    check(&mut app.model)?;

    let result = app
        .model
        .current_result()
        .context("the model returned no result")?;
    write_output(config, "fusion", result, output)
}

fn crop(
    config: &AppConfig,
    input: &Path,
    rect: CropRect,
    aspect: AspectRatio,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let mut model = AppModel::new(config, ScenarioList::defaults());
    let slot = PhotoSlot::Person;
    send(&mut model, AppMessage::Upload {
        slot,
        image: ImageHandle::from_path(input)?,
    })?;
    send(&mut model, AppMessage::OpenCropper(slot))?;
    send(&mut model, AppMessage::SetAspect(aspect))?;
    send(&mut model, AppMessage::SetCropRegion(rect))?;
    if let ToolMode::Crop(session) = &model.tool {
        let (x, y, w, h) = session.pixel_region().as_tuple();
        log::info!("Cropping {}x{} at {x},{y}", w, h);
    }
    send(&mut model, AppMessage::ApplyCrop)?;

    let cropped = model.photo(slot).context("crop produced no image")?;
    write_output(config, "crop", cropped, output)
}

fn mask(
    config: &AppConfig,
    input: &Path,
    strokes: &StrokeArgs,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let mut model = AppModel::new(config, ScenarioList::defaults());
    paint(&mut model, input, strokes)?;

    let ToolMode::Mask(editor) = &model.tool else {
        bail!("mask editor did not open");
    };
    if editor.canvas.is_blank() {
        bail!("{}", photofuse::error::MissingInput::MaskArea);
    }
    let (w, h) = editor.natural;
    let mask = image::DynamicImage::ImageLuma8(editor.canvas.export(w, h));
    let handle = ImageHandle::from_image(&mask, MASK_FILE_NAME)?;
    write_output(config, "mask", &handle, output)
}

async fn inpaint(
    config: &AppConfig,
    store: ScenarioStore,
    input: &Path,
    strokes: &StrokeArgs,
    prompt: String,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let mut app = App::new(config, FusionService::new(GeminiClient::new(config)?), store);
    paint(&mut app.model, input, strokes)?;

    app.dispatch(AppMessage::MaskPromptChanged(prompt)).await;
    app.dispatch(AppMessage::GenerateInpaint).await;
    check(&mut app.model)?;

    let result = app
        .model
        .current_result()
        .context("the model returned no result")?;
    write_output(config, "edit", result, output)
}

fn scenarios(config: &AppConfig, store: &ScenarioStore, cmd: ScenarioCommand) -> anyhow::Result<()> {
    let mut model = AppModel::new(config, store.load());
    match cmd {
        ScenarioCommand::List => {
            for s in model.scenarios.iter() {
                println!("{:<32} {}", s.value, s.label);
            }
            return Ok(());
        }
        ScenarioCommand::Show { value } => {
            let s = model
                .scenarios
                .find(&value)
                .with_context(|| format!("no scenario \"{value}\""))?;
            println!("{}\n{}\n\n{}", s.label, s.value, s.description);
            return Ok(());
        }
        ScenarioCommand::Reset => {
            store.reset()?;
            println!("Restored {} built-in scenarios.", ScenarioList::defaults().len());
            return Ok(());
        }
        ScenarioCommand::Add { label, description } => {
            // The draft grows by one; the saved list still has the old length.
            let index = model.scenarios.len();
            send(&mut model, AppMessage::OpenScenarioForm)?;
            send(&mut model, AppMessage::AddScenario)?;
            send(&mut model, AppMessage::ScenarioLabelChanged { index, label })?;
            send(&mut model, AppMessage::ScenarioDescriptionChanged { index, description })?;
        }
        ScenarioCommand::Edit {
            value,
            label,
            description,
        } => {
            let index = position(&model, &value)?;
            send(&mut model, AppMessage::OpenScenarioForm)?;
            if let Some(label) = label {
                send(&mut model, AppMessage::ScenarioLabelChanged { index, label })?;
            }
            if let Some(description) = description {
                send(&mut model, AppMessage::ScenarioDescriptionChanged { index, description })?;
            }
        }
        ScenarioCommand::Remove { value } => {
            let index = position(&model, &value)?;
            send(&mut model, AppMessage::OpenScenarioForm)?;
            send(&mut model, AppMessage::RemoveScenario(index))?;
        }
    }

    match send(&mut model, AppMessage::SaveScenarios)? {
        Command::PersistScenarios(list) => {
            store.save(&list)?;
            println!("Saved {} scenarios.", list.len());
            Ok(())
        }
        other => bail!("unexpected command {other:?}"),
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Apply one message without a runtime. Errors raised by the update surface here.
fn send(model: &mut AppModel, message: AppMessage) -> anyhow::Result<Command> {
    let command = update(model, message);
    check(model)?;
    Ok(command)
}

fn check(model: &mut AppModel) -> anyhow::Result<()> {
    match model.error.take() {
        Some(msg) => bail!(msg),
        None => Ok(()),
    }
}

fn position(model: &AppModel, value: &str) -> anyhow::Result<usize> {
    model
        .scenarios
        .position(value)
        .with_context(|| format!("no scenario \"{value}\""))
}

/// Open the mask editor on `input` at native size and replay the strokes.
fn paint(model: &mut AppModel, input: &Path, args: &StrokeArgs) -> anyhow::Result<()> {
    let raw = fs::read_to_string(&args.strokes)
        .with_context(|| format!("reading {}", args.strokes.display()))?;
    let strokes: Vec<Vec<(f32, f32)>> =
        serde_json::from_str(&raw).context("strokes must be a list of [x, y] point lists")?;

    let target = ImageHandle::from_path(input)?;
    let (w, h) = target.dimensions()?;
    send(model, AppMessage::ImportResult(target))?;
    send(model, AppMessage::OpenMaskEditor)?;
    send(model, AppMessage::MaskLayout {
        width: w as f32,
        height: h as f32,
    })?;
    if let Some(size) = args.brush {
        send(model, AppMessage::SetBrushSize(size))?;
    }

    for stroke in strokes {
        let mut points = stroke.into_iter();
        let Some((x, y)) = points.next() else {
            continue;
        };
        send(model, AppMessage::MaskStrokeStart { x, y })?;
        for (x, y) in points {
            send(model, AppMessage::MaskStrokeMove { x, y })?;
        }
        send(model, AppMessage::MaskStrokeEnd)?;
    }
    Ok(())
}

/// Write `image` to `--out` or a digest-named file, then optionally show it.
fn write_output(
    config: &AppConfig,
    kind: &str,
    image: &ImageHandle,
    args: &OutputArgs,
) -> anyhow::Result<()> {
    let path = match &args.out {
        Some(path) => path.clone(),
        None => {
            let ext = Path::new(image.file_name())
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("png");
            let digest = image.digest();
            let short = &digest[..DIGEST_NAME_LEN.min(digest.len())];
            config.resolve_output_dir().join(format!("{kind}-{short}.{ext}"))
        }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    image
        .save(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    log::info!("Wrote {}", path.display());
    println!("{}", path.display());

    if args.open {
        open::that(&path).with_context(|| format!("opening {}", path.display()))?;
    }
    Ok(())
}
