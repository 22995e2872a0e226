//! Command implementations.

use std::fmt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use fragedit_core::{
    CompileError, ControllerConfig, FrameInputs, LoadOutcome, NagaBackend, ShaderBackend,
    ShaderController, TextureTarget, UniformTable, UniformType, TEXTURE_SLOT_COUNT,
};
use fragedit_vfs::{FileProvider, FileSystemProvider};
use glam::{Mat4, Vec2};
use thiserror::Error;

use crate::args::{Cli, Command, RunArgs, SetArgs};
use crate::fs_watcher::ShaderWatcher;
use crate::settings::Settings;

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("cannot read shader {0}")]
    Unreadable(PathBuf),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("shader has no uniform named '{0}'")]
    UnknownUniform(String),
    #[error("uniform '{name}' has {length} elements, element {element} is out of range")]
    ElementOutOfRange {
        name: String,
        element: u32,
        length: u32,
    },
    #[error("{ty} takes {expected} values, got {actual}")]
    ComponentCount {
        ty: UniformType,
        expected: usize,
        actual: usize,
    },
    #[error("'{0}' is not a valid number")]
    BadNumber(String),
    #[error("texture unit {0} does not exist, units are 0..{}", TEXTURE_SLOT_COUNT - 1)]
    TextureUnitOutOfRange(i32),
    #[error("failed to save uniform values")]
    SaveFailed,
}

/// Run the parsed command line against the native file system.
pub fn execute(cli: Cli) -> Result<(), CommandError> {
    let fs = FileSystemProvider::new();
    let mut settings = Settings::load_or_default(&fs, &cli.config);

    match cli.command {
        Command::Run(args) => {
            settings.apply_run_args(&args);
            run(fs, &settings, &args)
        }
        Command::Inspect { shader } => {
            let controller = open(NagaBackend::new(), fs, &settings.controller, &shader)?;
            for line in describe_table(controller.uniforms()) {
                println!("{line}");
            }
            Ok(())
        }
        Command::Set(args) => set(fs, &settings, &args),
        Command::Clear { shader } => {
            let mut controller = open(NagaBackend::new(), fs, &settings.controller, &shader)?;
            controller.clear_uniforms();
            save(&controller)
        }
    }
}

/// Open `shader` and require it to compile.
pub fn open<B: ShaderBackend, F: FileProvider>(
    backend: B,
    fs: F,
    config: &ControllerConfig,
    shader: &Path,
) -> Result<ShaderController<B, F>, CommandError> {
    let mut controller = ShaderController::new(backend, fs, config.clone());
    match controller.open_shader(shader) {
        LoadOutcome::Loaded { .. } => Ok(controller),
        LoadOutcome::Unreadable => Err(CommandError::Unreadable(shader.to_path_buf())),
        LoadOutcome::CompileFailed => Err(controller
            .compile_error()
            .cloned()
            .unwrap_or_else(|| CompileError::new("unknown error"))
            .into()),
    }
}

fn save<B: ShaderBackend, F: FileProvider>(
    controller: &ShaderController<B, F>,
) -> Result<(), CommandError> {
    if controller.uniforms().is_empty() {
        log::info!("Shader has no uniforms, nothing to save");
        return Ok(());
    }
    if controller.save_uniforms() {
        Ok(())
    } else {
        Err(CommandError::SaveFailed)
    }
}

fn set<F: FileProvider>(fs: F, settings: &Settings, args: &SetArgs) -> Result<(), CommandError> {
    let mut controller = open(NagaBackend::new(), fs, &settings.controller, &args.shader)?;
    set_value(
        controller.uniforms_mut(),
        &args.name,
        args.element,
        &args.values,
    )?;
    save(&controller)
}

// ---------------------------------------------------------------------------
// Live loop
// ---------------------------------------------------------------------------

/// Options of the headless live-reload loop.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Stop after this many frames; run forever when `None`.
    pub max_frames: Option<u64>,
    /// Sleep between frames.
    pub frame_duration: Option<Duration>,
    pub inputs: FrameInputs,
}

/// What happened during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub reloads: u32,
    pub failed_reloads: u32,
}

impl RunSummary {
    fn record(&mut self, outcome: Option<LoadOutcome>) {
        match outcome {
            Some(LoadOutcome::Loaded { .. }) => self.reloads += 1,
            Some(LoadOutcome::CompileFailed) => self.failed_reloads += 1,
            Some(LoadOutcome::Unreadable) | None => {}
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames, {} reloads ({} failed)",
            self.frames, self.reloads, self.failed_reloads
        )
    }
}

/// Drive `controller` frame by frame.
///
/// A watcher event triggers an immediate modification check on top of the
/// controller's own polling.
pub fn run_loop<B: ShaderBackend, F: FileProvider>(
    controller: &mut ShaderController<B, F>,
    options: &RunOptions,
    watcher: Option<&ShaderWatcher>,
) -> RunSummary {
    let mut summary = RunSummary::default();
    while options.max_frames.map_or(true, |max| summary.frames < max) {
        if watcher.is_some_and(ShaderWatcher::poll_changed) {
            summary.record(controller.poll_for_changes());
        }
        summary.record(controller.update(&options.inputs));
        summary.frames += 1;

        if let Some(duration) = options.frame_duration {
            thread::sleep(duration);
        }
    }
    summary
}

fn run<F: FileProvider>(fs: F, settings: &Settings, args: &RunArgs) -> Result<(), CommandError> {
    let mut controller = ShaderController::new(NagaBackend::new(), fs, settings.controller.clone());
    match controller.open_shader(&args.shader) {
        LoadOutcome::Unreadable => return Err(CommandError::Unreadable(args.shader.clone())),
        LoadOutcome::CompileFailed => log::warn!("Shader does not compile yet, waiting for changes"),
        LoadOutcome::Loaded { .. } => {}
    }

    let slot_images = args
        .textures
        .iter()
        .map(|image| (image, TextureTarget::Texture2D))
        .chain(args.cubes.iter().map(|image| (image, TextureTarget::Cube)));
    for (image, target) in slot_images {
        if let Err(err) = controller.load_texture(image.slot, &image.path, target) {
            log::warn!("Texture slot {} left unchanged: {err}", image.slot);
        }
    }

    let watcher = if args.watch {
        let watcher = ShaderWatcher::new(&args.shader);
        if watcher.is_none() {
            log::warn!("File watching unavailable, relying on polling");
        }
        watcher
    } else {
        None
    };

    let fps = controller.config().frames_per_second;
    let options = RunOptions {
        max_frames: args.max_frames,
        frame_duration: frame_duration(fps),
        inputs: FrameInputs {
            resolution: Vec2::new(settings.window.width as f32, settings.window.height as f32),
            view_matrix: Mat4::IDENTITY,
        },
    };

    let summary = run_loop(&mut controller, &options, watcher.as_ref());
    log::info!("Stopped after {summary}");
    Ok(())
}

/// Sleep between frames at `fps`. `None` when the rate is not positive or
/// the interval does not fit a [`Duration`].
fn frame_duration(fps: f32) -> Option<Duration> {
    if fps > 0.0 {
        Duration::try_from_secs_f32(fps.recip()).ok()
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Value editing and display
// ---------------------------------------------------------------------------

/// Overwrite one element of the uniform called `name` with parsed `values`.
pub fn set_value(
    table: &mut UniformTable,
    name: &str,
    element: u32,
    values: &[String],
) -> Result<(), CommandError> {
    let index = table
        .find(name)
        .ok_or_else(|| CommandError::UnknownUniform(name.to_owned()))?;
    let (ty, length, element_size) = match table.get(index) {
        Some(d) => (d.ty(), d.array_length(), d.element_byte_size()),
        None => return Err(CommandError::UnknownUniform(name.to_owned())),
    };
    if element >= length {
        return Err(CommandError::ElementOutOfRange {
            name: name.to_owned(),
            element,
            length,
        });
    }
    let bytes = parse_components(ty, values)?;

    let start = element as usize * element_size;
    if let Some(target) = table
        .value_mut(index)
        .and_then(|value| value.get_mut(start..start + element_size))
    {
        target.copy_from_slice(&bytes);
    }
    Ok(())
}

fn parse_components(ty: UniformType, values: &[String]) -> Result<Vec<u8>, CommandError> {
    if values.len() != ty.component_count() {
        return Err(CommandError::ComponentCount {
            ty,
            expected: ty.component_count(),
            actual: values.len(),
        });
    }
    let mut bytes = Vec::with_capacity(ty.size());
    for value in values {
        let bad = || CommandError::BadNumber(value.clone());
        if ty.is_float() {
            let v: f32 = value.parse().map_err(|_| bad())?;
            bytes.extend_from_slice(&v.to_ne_bytes());
        } else {
            let v: i32 = value.parse().map_err(|_| bad())?;
            let is_sampler = matches!(ty, UniformType::Sampler2D | UniformType::SamplerCube);
            if is_sampler && !usize::try_from(v).is_ok_and(|unit| unit < TEXTURE_SLOT_COUNT) {
                return Err(CommandError::TextureUnitOutOfRange(v));
            }
            bytes.extend_from_slice(&v.to_ne_bytes());
        }
    }
    Ok(bytes)
}

/// One line per uniform: name, type, offset, flags and values.
pub fn describe_table(table: &UniformTable) -> Vec<String> {
    (0..table.len())
        .filter_map(|index| describe_uniform(table, index))
        .collect()
}

fn describe_uniform(table: &UniformTable, index: usize) -> Option<String> {
    let descriptor = table.get(index)?;
    let value = table.value(index)?;
    let ty = descriptor.ty();

    let type_label = if descriptor.array_length() > 1 {
        format!("{ty}[{}]", descriptor.array_length())
    } else {
        ty.to_string()
    };
    let elements: Vec<String> = value
        .chunks_exact(descriptor.element_byte_size())
        .map(|element| format_element(ty, element))
        .collect();
    let flags = if descriptor.is_color() { " color" } else { "" };

    Some(format!(
        "{:<24} {:<14} @{:<6}{flags} {}",
        descriptor.name(),
        type_label,
        descriptor.value_offset(),
        elements.join(" ")
    ))
}

fn format_element(ty: UniformType, bytes: &[u8]) -> String {
    let components: Vec<String> = bytes
        .chunks_exact(4)
        .map(|c| {
            let raw = [c[0], c[1], c[2], c[3]];
            if ty.is_float() {
                f32::from_ne_bytes(raw).to_string()
            } else {
                i32::from_ne_bytes(raw).to_string()
            }
        })
        .collect();
    if components.len() == 1 {
        components.join("")
    } else {
        format!("({})", components.join(", "))
    }
}
