//! egui inspector for the live uniform table.
//!
//! One control row per array element of every non-built-in uniform. Edits
//! are written straight into the table's buffer; the table itself is never
//! resized or reordered from here.

use bytemuck::Pod;

use crate::backend::ShaderBackend;
use crate::config::BuiltinUniformNames;
use crate::controller::{DataAction, ShaderController};
use crate::texture::{TextureSlots, TEXTURE_SLOT_COUNT};
use crate::uniform::{UniformTable, UniformType, MAX_UNIFORM_NAME_LEN};
use fragedit_vfs::FileProvider;

/// Highest texture unit offered for sampler uniforms.
const MAX_TEXTURE_UNIT: i32 = TEXTURE_SLOT_COUNT as i32 - 1;

// ---------------------------------------------------------------------------
// Uniform list
// ---------------------------------------------------------------------------

/// Show every uniform not named in `builtins`. Returns `true` if any value changed.
pub fn show_uniforms(
    ui: &mut egui::Ui,
    table: &mut UniformTable,
    builtins: &BuiltinUniformNames,
) -> bool {
    let mut changed = false;
    for index in 0..table.len() {
        let hidden = table
            .get(index)
            .is_some_and(|d| builtins.contains(d.name()));
        if !hidden {
            changed |= show_uniform(ui, table, index);
        }
    }
    changed
}

/// Show the controls of one uniform. Returns `true` if its value changed.
///
/// Float `vec3`/`vec4` uniforms get an "is color" toggle in the label's
/// context menu.
pub fn show_uniform(ui: &mut egui::Ui, table: &mut UniformTable, index: usize) -> bool {
    let Some(descriptor) = table.get(index) else {
        return false;
    };
    let name = descriptor.name().to_owned();
    let ty = descriptor.ty();
    let array_length = descriptor.array_length();
    let is_color = descriptor.is_color();
    let element_size = descriptor.element_byte_size();

    let mut color_toggle = None;
    let mut changed = false;
    if let Some(value) = table.value_mut(index) {
        for (element, bytes) in value.chunks_exact_mut(element_size).enumerate() {
            let label = element_label(&name, array_length, element);
            changed |= match ty {
                UniformType::Mat2 | UniformType::Mat3 | UniformType::Mat4 => {
                    show_matrix(ui, &label, ty, bytes)
                }
                _ => {
                    ui.horizontal(|ui| {
                        let response =
                            ui.add(egui::Label::new(label.as_str()).sense(egui::Sense::click()));
                        if ty.supports_color() {
                            response.context_menu(|ui| {
                                let mut flag = is_color;
                                if ui.checkbox(&mut flag, "is color").changed() {
                                    color_toggle = Some(flag);
                                }
                            });
                        }
                        show_element(ui, ty, is_color, bytes)
                    })
                    .inner
                }
            };
        }
    }

    if let Some(flag) = color_toggle {
        table.set_color(index, flag);
    }
    changed
}

fn element_label(name: &str, array_length: u32, element: usize) -> String {
    if array_length > 1 {
        format!("{name}[{element}]")
    } else {
        name.to_owned()
    }
}

// ---------------------------------------------------------------------------
// Value widgets
// ---------------------------------------------------------------------------

/// Widgets for one non-matrix element.
fn show_element(ui: &mut egui::Ui, ty: UniformType, is_color: bool, bytes: &mut [u8]) -> bool {
    match ty {
        UniformType::Vec3 if is_color => {
            let mut rgb: [f32; 3] = bytemuck::pod_read_unaligned(bytes);
            write_if(ui.color_edit_button_rgb(&mut rgb).changed(), bytes, &rgb)
        }
        UniformType::Vec4 if is_color => {
            let mut rgba: [f32; 4] = bytemuck::pod_read_unaligned(bytes);
            write_if(
                ui.color_edit_button_rgba_unmultiplied(&mut rgba).changed(),
                bytes,
                &rgba,
            )
        }
        UniformType::Sampler2D | UniformType::SamplerCube => {
            let mut unit: i32 = bytemuck::pod_read_unaligned(bytes);
            let response = ui.add(
                egui::DragValue::new(&mut unit)
                    .range(0..=MAX_TEXTURE_UNIT)
                    .prefix("unit "),
            );
            write_if(response.changed(), bytes, &unit)
        }
        ty if ty.is_float() => drag_components::<f32>(ui, bytes, 0.01),
        _ => drag_components::<i32>(ui, bytes, 0.1),
    }
}

/// One row per column, labelled `name[column]`.
fn show_matrix(ui: &mut egui::Ui, label: &str, ty: UniformType, bytes: &mut [u8]) -> bool {
    let columns = match ty {
        UniformType::Mat2 => 2,
        UniformType::Mat3 => 3,
        _ => 4,
    };
    let column_size = bytes.len() / columns;

    let mut changed = false;
    for (column, column_bytes) in bytes.chunks_exact_mut(column_size).enumerate() {
        changed |= ui
            .horizontal(|ui| {
                ui.label(format!("{label}[{column}]"));
                drag_components::<f32>(ui, column_bytes, 0.01)
            })
            .inner;
    }
    changed
}

/// A drag value per 4-byte component of `bytes`.
fn drag_components<T>(ui: &mut egui::Ui, bytes: &mut [u8], speed: f64) -> bool
where
    T: Pod + egui::emath::Numeric,
{
    let mut changed = false;
    for component in bytes.chunks_exact_mut(std::mem::size_of::<T>()) {
        let mut value: T = bytemuck::pod_read_unaligned(component);
        let response = ui.add(egui::DragValue::new(&mut value).speed(speed));
        changed |= write_if(response.changed(), component, &value);
    }
    changed
}

fn write_if<T: Pod>(changed: bool, bytes: &mut [u8], value: &T) -> bool {
    if changed {
        bytes.copy_from_slice(bytemuck::bytes_of(value));
    }
    changed
}

// ---------------------------------------------------------------------------
// Panels
// ---------------------------------------------------------------------------

/// Editors for the built-in uniform names. Returns `true` if a name changed.
pub fn show_builtin_names(ui: &mut egui::Ui, names: &mut BuiltinUniformNames) -> bool {
    let mut changed = false;
    egui::Grid::new("builtin_uniform_names")
        .num_columns(2)
        .show(ui, |ui| {
            for (label, name) in [
                ("time", &mut names.time),
                ("resolution", &mut names.resolution),
                ("view matrix", &mut names.view_matrix),
            ] {
                ui.label(label);
                changed |= ui
                    .add(egui::TextEdit::singleline(name).char_limit(MAX_UNIFORM_NAME_LEN))
                    .changed();
                ui.end_row();
            }
        });
    changed
}

/// Clear / Save / Load buttons.
pub fn show_data_toolbar(ui: &mut egui::Ui) -> Option<DataAction> {
    ui.horizontal(|ui| {
        let mut action = None;
        if ui.button("Clear").clicked() {
            action = Some(DataAction::Clear);
        }
        if ui.button("Save").clicked() {
            action = Some(DataAction::Save);
        }
        if ui.button("Load").clicked() {
            action = Some(DataAction::Load);
        }
        action
    })
    .inner
}

/// One row per texture slot with its image and a clear button.
///
/// Returns the slot whose clear button was clicked.
pub fn show_texture_slots(ui: &mut egui::Ui, slots: &TextureSlots) -> Option<usize> {
    let mut cleared = None;
    egui::Grid::new("texture_slots")
        .num_columns(3)
        .show(ui, |ui| {
            for (index, slot) in slots.iter().enumerate() {
                ui.label(format!("{index}:"));
                if ui
                    .add_enabled(!slot.is_empty(), egui::Button::new("x").small())
                    .clicked()
                {
                    cleared = Some(index);
                }
                match slot.image_path() {
                    Some(path) => {
                        let (width, height) = slot.size();
                        ui.label(format!("{} {width}x{height}", slot.target().label()))
                            .on_hover_text(path.display().to_string());
                    }
                    None => {
                        ui.weak("empty");
                    }
                }
                ui.end_row();
            }
        });
    cleared
}

/// Full controller panel: playback, auto-reload, built-in names, uniforms
/// and data actions. Shows the compiler output instead of the uniforms
/// while a compile error is active.
pub fn show_controller_panel<B: ShaderBackend, F: FileProvider>(
    ui: &mut egui::Ui,
    controller: &mut ShaderController<B, F>,
) {
    ui.horizontal(|ui| {
        let playing = controller.is_playing();
        if ui.button(if playing { "Pause" } else { "Play" }).clicked() {
            controller.set_playing(!playing);
        }
        if ui.button("Reset").clicked() {
            controller.reset_animation();
        }
        ui.label(format!("t = {:.2}s", controller.time()));
        ui.checkbox(&mut controller.config_mut().autoreload, "Autoreload");
    });

    if let Some(err) = controller.compile_error() {
        ui.separator();
        ui.colored_label(egui::Color32::LIGHT_RED, "Compile error");
        ui.monospace(err.diagnostics.as_str());
        return;
    }

    egui::CollapsingHeader::new("Built-in uniforms")
        .default_open(false)
        .show(ui, |ui| {
            show_builtin_names(ui, &mut controller.config_mut().builtin_uniforms);
        });

    ui.separator();
    let builtins = controller.config().builtin_uniforms.clone();
    show_uniforms(ui, controller.uniforms_mut(), &builtins);

    egui::CollapsingHeader::new("Textures")
        .default_open(false)
        .show(ui, |ui| {
            if let Some(slot) = show_texture_slots(ui, controller.texture_slots()) {
                controller.clear_texture_slot(slot);
            }
        });

    ui.separator();
    if let Some(action) = show_data_toolbar(ui) {
        controller.apply_data_action(action);
    }
}
