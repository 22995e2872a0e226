//! Command line arguments.
//!
//! ```bash
//! # Live-reload a shader headlessly, watching its directory
//! fragedit run shaders/plasma.wgsl --watch
//!
//! # Print the uniform table with the saved values
//! fragedit inspect shaders/plasma.wgsl
//!
//! # Store a value in the snapshot
//! fragedit set shaders/plasma.wgsl u_tint_color 1.0 0.5 0.25
//!
//! # Run 120 frames then exit (useful for testing)
//! fragedit run shaders/plasma.wgsl --max-frames 120
//!
//! # Fill texture slot 0 with an image and slot 1 with a cube cross
//! fragedit run shaders/plasma.wgsl --texture 0=wood.png --cube 1=sky.png
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use fragedit_core::TEXTURE_SLOT_COUNT;

/// Fragedit command line.
#[derive(Parser, Debug)]
#[command(
    name = "fragedit",
    about = "Live fragment shader editor",
    long_about = "Live fragment shader editor.\n\n\
        Shaders are WGSL fragment shaders. Uniform values are kept in a\n\
        `<shader>.uniformdata` file next to the shader and survive restarts\n\
        and edits to the shader source.",
    version
)]
pub struct Cli {
    /// Settings file. Missing files fall back to defaults.
    #[arg(long, global = true, default_value = "fragedit.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Live-reload a shader, re-binding uniform values on every change.
    Run(RunArgs),
    /// Print every uniform with its saved value.
    Inspect {
        /// Fragment shader to load.
        shader: PathBuf,
    },
    /// Write one uniform element and save the snapshot.
    Set(SetArgs),
    /// Reset every saved value of a shader to zero.
    Clear {
        /// Fragment shader to load.
        shader: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Fragment shader to load.
    pub shader: PathBuf,

    /// Exit after N frames (useful for testing).
    #[arg(long)]
    pub max_frames: Option<u64>,

    /// Frame rate of the loop and the animation clock.
    #[arg(long)]
    pub fps: Option<f32>,

    /// Do not poll the shader file for changes.
    #[arg(long)]
    pub no_autoreload: bool,

    /// Reload as soon as the file system reports a change.
    #[arg(long)]
    pub watch: bool,

    /// Framebuffer width reported to the shader.
    #[arg(long, requires = "height")]
    pub width: Option<u32>,

    /// Framebuffer height reported to the shader.
    #[arg(long, requires = "width")]
    pub height: Option<u32>,

    /// Load a 2D texture into a slot, as SLOT=PATH. Repeatable.
    #[arg(long = "texture", value_name = "SLOT=PATH", value_parser = parse_slot_image)]
    pub textures: Vec<SlotImage>,

    /// Load a cube map from a 4x3 horizontal cross into a slot, as SLOT=PATH. Repeatable.
    #[arg(long = "cube", value_name = "SLOT=PATH", value_parser = parse_slot_image)]
    pub cubes: Vec<SlotImage>,
}

/// An image file destined for a texture slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotImage {
    pub slot: usize,
    pub path: PathBuf,
}

fn parse_slot_image(value: &str) -> Result<SlotImage, String> {
    let (slot, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected SLOT=PATH, got '{value}'"))?;
    let slot: usize = slot
        .trim()
        .parse()
        .map_err(|_| format!("'{slot}' is not a slot number"))?;
    if slot >= TEXTURE_SLOT_COUNT {
        return Err(format!(
            "slot {slot} out of range, slots are 0..{}",
            TEXTURE_SLOT_COUNT - 1
        ));
    }
    if path.is_empty() {
        return Err("missing image path".to_owned());
    }
    Ok(SlotImage {
        slot,
        path: PathBuf::from(path),
    })
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Fragment shader to load.
    pub shader: PathBuf,

    /// Uniform name.
    pub name: String,

    /// One number per component (e.g. three for a vec3, sixteen for a mat4).
    #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
    pub values: Vec<String>,

    /// Array element to write.
    #[arg(long, default_value = "0")]
    pub element: u32,
}
