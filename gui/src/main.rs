use std::thread;

use anyhow::{anyhow, Context};
use clap::Parser;
use eframe::egui;
use eframe::egui::{ScrollArea, Ui};
use eframe::run_native;
use life_engine::pattern::{self, Pattern, PATTERNS};
use life_engine::{RunState, SimulationLoop};

mod args;

use args::Args;

/// Gap between two drawn cells.
const CELL_GAP: f32 = 1.0;
const CONTROLS_HEIGHT: f32 = 120.0;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = args.to_config();
    config.validate().context("invalid grid size")?;

    let simulation = SimulationLoop::new(config.clone()).context("failed to create the simulation")?;
    if let Some(name) = &args.pattern {
        let pattern = pattern::find(name).with_context(|| format!("unknown pattern `{name}`"))?;
        place_centered(&simulation, pattern);
    }

    let pitch = config.cell_size + CELL_GAP;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([
            (pitch * config.cols as f32 + 32.0).max(360.0),
            pitch * config.rows as f32 + CONTROLS_HEIGHT,
        ]),
        ..Default::default()
    };

    run_native(
        "Game of Life GUI",
        options,
        Box::new(move |cc| {
            let ctx = cc.egui_ctx.clone();
            let updates = simulation.subscribe();

            // Repaint whenever the engine publishes a grid; ends with the simulation.
            thread::spawn(move || {
                for _ in updates {
                    ctx.request_repaint();
                }
            });

            Ok(Box::new(GuiOfLife::new(cc, simulation)))
        }),
    )
    .map_err(|err| anyhow!("failed to run the window: {err}"))
}

/// Stamps `pattern` so that its bounding box sits in the middle of the grid.
fn place_centered(simulation: &SimulationLoop, pattern: &Pattern) {
    let (rows, cols) = simulation.dimensions();
    let (height, width) = pattern.extent();
    let placed = simulation.stamp_pattern(
        pattern,
        rows.saturating_sub(height) / 2,
        cols.saturating_sub(width) / 2,
    );
    log::info!("placed {} ({placed} cells)", pattern.name);
}

fn start_stop_label(state: RunState) -> &'static str {
    match state {
        RunState::Running => "Stop",
        RunState::Stopped => "Start",
    }
}

struct GuiOfLife {
    simulation: SimulationLoop,
    cell_size: f32,
}

impl GuiOfLife {
    fn new(_cc: &eframe::CreationContext<'_>, simulation: SimulationLoop) -> Self {
        let cell_size = simulation.config().cell_size;
        Self {
            simulation,
            cell_size,
        }
    }

    fn controls(&mut self, ui: &mut Ui) {
        let state = self.simulation.run_state();

        ui.horizontal(|ui| {
            if ui.button(start_stop_label(state)).clicked() {
                if state.is_running() {
                    self.simulation.stop();
                } else {
                    self.simulation.start();
                }
            }
            if ui
                .add_enabled(!state.is_running(), egui::Button::new("Step"))
                .clicked()
            {
                self.simulation.tick_once();
            }
            if ui.button("Random").clicked() {
                self.simulation.randomize_grid();
            }
            if ui.button("Clear").clicked() {
                self.simulation.clear_grid();
            }
            ui.menu_button("Patterns", |ui| {
                for pattern in PATTERNS {
                    if ui.button(pattern.name).clicked() {
                        place_centered(&self.simulation, pattern);
                        ui.close_menu();
                    }
                }
            });
        });
    }

    fn create_grid(&mut self, ui: &mut Ui) {
        let snapshot = self.simulation.snapshot();
        let (rows, cols) = snapshot.grid.dimensions();
        let pitch = self.cell_size + CELL_GAP;

        ui.label(format!(
            "Generation {}    Population {}",
            snapshot.generation,
            snapshot.grid.population()
        ));

        let (rect, response) = ui.allocate_exact_size(
            egui::vec2(pitch * cols as f32, pitch * rows as f32),
            egui::Sense::click(),
        );

        let painter = ui.painter_at(rect);
        for (row_index, row) in snapshot.grid.iter_rows().enumerate() {
            for (col_index, cell) in row.iter().enumerate() {
                let pos = rect.min + egui::vec2(col_index as f32 * pitch, row_index as f32 * pitch);
                let cell_rect = egui::Rect::from_min_size(pos, egui::vec2(self.cell_size, self.cell_size));

                let color = if cell.is_alive() {
                    egui::Color32::BLACK
                } else {
                    egui::Color32::WHITE
                };

                painter.rect_filled(cell_rect, 0.0, color);
                painter.rect_stroke(cell_rect, 0.0, (CELL_GAP, egui::Color32::BLACK));
            }
        }

        if response.clicked() {
            if let Some(pointer) = response.interact_pointer_pos() {
                let offset = pointer - rect.min;
                let row = (offset.y / pitch) as usize;
                let col = (offset.x / pitch) as usize;
                if let Err(err) = self.simulation.toggle_cell(row, col) {
                    log::warn!("ignoring click: {err}");
                }
            }
        }
    }
}

impl eframe::App for GuiOfLife {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::both().show(ui, |ui| {
                ui.heading("Conway's Game of Life");
                self.controls(ui);
                self.create_grid(ui);
            });
        });
    }
}
