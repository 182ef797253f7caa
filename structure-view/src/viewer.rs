//! Interactive season viewer for the plant structure model, built with
//! eframe/egui.
//!
//! [`Viewer`] plays the host: it owns the demo plant, phenology, leaf
//! cohorts and weather, runs the daily event sequence against a
//! [`Structure`], and plots the outputs over time.

use eframe::App;
use glam::Vec2;
use rand::rng;
use structure_core::{
    Structure,
    config::{RateParameters, StructureConfig},
    functions::{LinearInterpolation, SharedValue},
    lifecycle::{Season, SowingRecord},
    phases::BranchingTrigger,
    types::PlantId,
};
use tracing::{debug, info, warn};

use crate::host::{DemoLeaf, DemoPhenology, DemoPlant, Weather};

const PLANT: PlantId = 0;

/// Thermal time from sowing to the initialisation stage (°Cd).
const STAGE_THERMAL_TIME: f64 = 120.0;

/// Main-stem node number at which node appearance starts.
const INITIAL_NODE_NUMBER: f64 = 1.0;

/// One day's outputs, kept for plotting.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DayRecord {
    pub day: u32,
    pub thermal_time: f64,
    pub primordia: f64,
    pub nodes: f64,
    pub total_stems: f64,
    pub branch_number: f64,
    pub height: f64,
    pub population: f64,
}

/// Plottable output series.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Series {
    Primordia,
    Nodes,
    TotalStems,
    BranchNumber,
    Height,
    Population,
}

impl Series {
    pub const ALL: [Series; 6] = [
        Series::Primordia,
        Series::Nodes,
        Series::TotalStems,
        Series::BranchNumber,
        Series::Height,
        Series::Population,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Series::Primordia => "primordia",
            Series::Nodes => "main-stem nodes",
            Series::TotalStems => "stems /m²",
            Series::BranchNumber => "branches /plant",
            Series::Height => "height (cm)",
            Series::Population => "plants /m²",
        }
    }

    fn color(self) -> egui::Color32 {
        match self {
            Series::Primordia => egui::Color32::LIGHT_GRAY,
            Series::Nodes => egui::Color32::LIGHT_GREEN,
            Series::TotalStems => egui::Color32::LIGHT_BLUE,
            Series::BranchNumber => egui::Color32::GOLD,
            Series::Height => egui::Color32::LIGHT_RED,
            Series::Population => egui::Color32::WHITE,
        }
    }

    pub fn value(self, r: &DayRecord) -> f64 {
        match self {
            Series::Primordia => r.primordia,
            Series::Nodes => r.nodes,
            Series::TotalStems => r.total_stems,
            Series::BranchNumber => r.branch_number,
            // mm -> cm keeps it on the same scale as the counts.
            Series::Height => r.height / 10.0,
            Series::Population => r.population,
        }
    }
}

/// Builds a structure whose thermal time and height are driven by the
/// viewer: height follows main-stem node number up to `rates.height` at
/// the final node.
fn build_structure(
    rates: &RateParameters,
    trigger: BranchingTrigger,
    thermal_time: &SharedValue,
    node_number: &SharedValue,
) -> Structure {
    let mut functions = rates.clone().into_functions(thermal_time.clone());
    functions.height = Box::new(LinearInterpolation::new(
        node_number.clone(),
        vec![(0.0, 0.0), (rates.final_node_number, rates.height)],
    ));
    Structure::new(PLANT, StructureConfig::default(), functions).with_branching_trigger(trigger)
}

/// Main application state for the viewer.
///
/// The per-frame update is:
/// 1. Handle UI interactions.
/// 2. If `running` and enough time has passed, simulate one day with
///    [`Viewer::step_once`].
/// 3. Plot the recorded history.
///
/// ### Fields
/// - `structure` - The model under study.
/// - `plant`, `phenology`, `leaf`, `weather` - Demo host collaborators.
/// - `thermal_time`, `node_number` - Host-written values read by the
///   model's thermal-time and height providers.
/// - `rates`, `sowing`, `trigger` - Parameters applied on the next reset.
/// - `history` - One [`DayRecord`] per simulated day.
/// - `visible` - Which [`Series::ALL`] entries are plotted.
/// - `zoom` - Per-axis world-to-screen scale; `pan` - screen offset.
/// - `thin_proportion` - Proportion removed by the Thin button.
/// - `last_error` - Last rejected lifecycle call, shown in the status bar.
pub struct Viewer {
    structure: Structure,
    plant: DemoPlant,
    phenology: DemoPhenology,
    leaf: DemoLeaf,
    weather: Weather,
    thermal_time: SharedValue,
    node_number: SharedValue,

    rates: RateParameters,
    sowing: SowingRecord,
    trigger: BranchingTrigger,

    rng: rand::rngs::ThreadRng,

    day: u32,
    history: Vec<DayRecord>,
    visible: [bool; 6],

    running: bool,
    zoom: Vec2,
    pan: egui::Vec2,

    thin_proportion: f64,
    last_error: Option<String>,

    step_interval: f64,
    last_step_time: f64,
    last_step_dt: f64,
}

impl Viewer {
    /// Creates a viewer with a freshly sown plant and default parameters.
    pub fn new() -> Self {
        let rates = RateParameters {
            height: 800.0,
            ..RateParameters::default()
        };
        let sowing = SowingRecord {
            plant: PLANT,
            population: 100.0,
            bud_number: 1.0,
            max_cover: 1.0,
        };
        let trigger = BranchingTrigger::WholeNodeCrossing;
        let thermal_time = SharedValue::new(0.0);
        let node_number = SharedValue::new(0.0);
        let structure = build_structure(&rates, trigger, &thermal_time, &node_number);

        let mut viewer = Self {
            structure,
            plant: DemoPlant {
                population: 0.0,
                alive: false,
            },
            phenology: DemoPhenology::new(
                StructureConfig::default().initialise_stage,
                STAGE_THERMAL_TIME,
            ),
            leaf: DemoLeaf::default(),
            weather: Weather::default(),
            thermal_time,
            node_number,
            rates,
            sowing,
            trigger,
            rng: rng(),
            day: 0,
            history: Vec::with_capacity(256),
            visible: [false, true, true, true, true, false],
            running: false,
            zoom: Vec2::new(4.0, 4.0),
            pan: egui::vec2(0.0, 0.0),
            thin_proportion: 0.5,
            last_error: None,
            step_interval: 0.05,
            last_step_time: 0.0,
            last_step_dt: 0.0,
        };
        viewer.reset();
        viewer
    }

    /// Starts a new season with the current parameters.
    ///
    /// Rebuilds the structure, fires commencing then sowing, and resets
    /// the host collaborators and history. A rejected sowing leaves the
    /// season inactive and records the error.
    fn reset(&mut self) {
        self.structure = build_structure(
            &self.rates,
            self.trigger,
            &self.thermal_time,
            &self.node_number,
        );
        self.thermal_time.set(0.0);
        self.node_number.set(0.0);
        self.phenology = DemoPhenology::new(
            self.structure.config().initialise_stage.clone(),
            STAGE_THERMAL_TIME,
        );
        self.leaf = DemoLeaf::default();
        self.day = 0;
        self.history.clear();
        self.running = false;
        self.last_error = None;

        self.structure.on_simulation_commencing();
        match self.structure.on_sowing(&self.sowing) {
            Ok(()) => {
                self.plant = DemoPlant {
                    population: self.sowing.population,
                    alive: true,
                };
                self.record_day();
            }
            Err(e) => {
                warn!(error = %e, "Sowing failed");
                self.plant = DemoPlant {
                    population: 0.0,
                    alive: false,
                };
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// Advances the season by one day.
    ///
    /// The host event order is:
    /// 1. Weather sets today's thermal time; phenology accumulates it.
    /// 2. Potential growth.
    /// 3. On the stage day, leaf cohorts initialise and node appearance starts.
    /// 4. Leaf update, then actual growth.
    /// 5. Height refresh.
    ///
    /// If plant mortality leaves no plants, the day is recorded and the
    /// plant ends before actual growth. Does nothing outside an active
    /// season.
    fn step_once(&mut self) {
        if self.structure.season() != Season::Active {
            return;
        }

        let tt = self.weather.thermal_time(&mut self.rng);
        self.thermal_time.set(tt);
        let stage_today = self.phenology.advance(tt);

        let outcome = self
            .structure
            .do_potential_growth(&mut self.plant, &self.phenology);
        if outcome.branched {
            debug!(day = self.day + 1, "Branching cohort appeared");
        }

        if self.plant.population <= 0.0 {
            warn!(day = self.day + 1, "No plants left");
            self.plant.alive = false;
            self.day += 1;
            self.record_day();
            self.end_plant();
            return;
        }

        if stage_today {
            self.leaf.initialised = true;
            if let Err(e) = self.structure.start_node_appearance(INITIAL_NODE_NUMBER) {
                warn!(error = %e, "Could not start node appearance");
                self.last_error = Some(e.to_string());
            }
        }

        self.leaf.update(
            self.structure.main_stem_node_number(),
            self.structure.total_stem_population(),
        );
        self.structure.do_actual_growth(&self.plant, &self.leaf);

        self.node_number.set(self.structure.main_stem_node_number());
        self.structure.update_height();

        self.day += 1;
        self.record_day();
    }

    fn record_day(&mut self) {
        self.history.push(DayRecord {
            day: self.day,
            thermal_time: self.thermal_time.get(),
            primordia: self.structure.main_stem_primordia_number(),
            nodes: self.structure.main_stem_node_number(),
            total_stems: self.structure.total_stem_population(),
            branch_number: self.structure.branch_number(),
            height: self.structure.height(),
            population: self.plant.population,
        });
    }

    fn thin(&mut self) {
        match self
            .structure
            .thin(self.thin_proportion, &mut self.plant, &mut self.leaf)
        {
            Ok(()) => self.last_error = None,
            Err(e) => {
                warn!(error = %e, "Thinning failed");
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn end_plant(&mut self) {
        if self.structure.on_plant_ending(PLANT) {
            self.plant.alive = false;
            self.running = false;
            info!(day = self.day, "Season ended");
        }
    }

    /// Converts a plot-space position `(day, value)` to screen-space.
    ///
    /// The origin sits at the bottom-left of `rect` (inset by a margin),
    /// scaled by `zoom` per axis and offset by `pan`. The y-axis is
    /// flipped so that larger values go up.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let origin = Self::plot_origin(rect);
        egui::pos2(
            origin.x + p.x * self.zoom.x + self.pan.x,
            origin.y - p.y * self.zoom.y + self.pan.y,
        )
    }

    /// Inverse of [`Viewer::world_to_screen`].
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let origin = Self::plot_origin(rect);
        let x = (p.x - origin.x - self.pan.x) / self.zoom.x;
        let y = (origin.y - p.y + self.pan.y) / self.zoom.y;
        Vec2::new(x, y)
    }

    fn plot_origin(rect: egui::Rect) -> egui::Pos2 {
        rect.left_bottom() + egui::vec2(40.0, -30.0)
    }

    /// Helper to draw a labeled `f64` [`egui::DragValue`].
    fn labeled_drag_f64(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f64,
        range: std::ops::RangeInclusive<f64>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, stepping, lifecycle actions).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                ui.add(
                    egui::DragValue::new(&mut self.step_interval)
                        .prefix("dt target = ")
                        .range(0.0..=1.0)
                        .speed(0.01),
                );

                if ui.button("Step day").clicked() {
                    let now = ctx.input(|i| i.time);
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = now - self.last_step_time;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                if ui.button("Re-sow").clicked() {
                    self.reset();
                }

                ui.separator();
                ui.add(
                    egui::DragValue::new(&mut self.thin_proportion)
                        .prefix("remove ")
                        .range(0.0..=1.0)
                        .speed(0.01),
                );
                if ui.button("Thin").clicked() {
                    self.thin();
                }

                if ui.button("End plant").clicked() {
                    self.end_plant();
                }

                ui.separator();
                let days = egui::Slider::new(&mut self.zoom.x, 0.5..=20.0);
                ui.add(days.text("days zoom"));
                let values = egui::Slider::new(&mut self.zoom.y, 0.1..=40.0);
                ui.add(values.text("value zoom"));
            });
        });
    }

    /// Builds the bottom status bar (day, season, key outputs).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt last = {:.3} s", self.last_step_dt));
                ui.separator();
                ui.label(format!("height = {:.0} mm", self.structure.height()));
                ui.label(format!("branches = {:.1}", self.structure.branch_number()));
                ui.label(format!(
                    "stems = {:.1} /m²",
                    self.structure.total_stem_population()
                ));
                ui.label(format!(
                    "nodes = {:.2} ({:.0}%)",
                    self.structure.main_stem_node_number(),
                    self.structure.relative_node_appearance(&self.leaf) * 100.0
                ));
                if let Some(today) = self.history.last() {
                    ui.label(format!("TT = {:.1} °Cd", today.thermal_time));
                }
                ui.label(format!("ΣTT = {:.0} °Cd", self.phenology.accumulated()));
                ui.label(format!("day {}", self.day));
                ui.label(match self.structure.season() {
                    Season::Active => "season active",
                    Season::Inactive => "season inactive",
                });
                if let Some(err) = &self.last_error {
                    ui.separator();
                    ui.colored_label(egui::Color32::RED, err);
                }
            });
        });
    }

    /// Builds the right-hand panel for rates, sowing, weather and series.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Parameters");
                ui.label("Applied on re-sow.");

                ui.separator();
                ui.label("Development");
                Self::labeled_drag_f64(
                    ui,
                    "plastochron (°Cd):",
                    &mut self.rates.primordia_initiation_rate,
                    0.0..=300.0,
                    1.0,
                );
                Self::labeled_drag_f64(
                    ui,
                    "phyllochron (°Cd):",
                    &mut self.rates.node_appearance_rate,
                    0.0..=300.0,
                    1.0,
                );
                Self::labeled_drag_f64(
                    ui,
                    "final nodes:",
                    &mut self.rates.final_node_number,
                    1.0..=40.0,
                    0.1,
                );
                Self::labeled_drag_f64(
                    ui,
                    "height (mm):",
                    &mut self.rates.height,
                    0.0..=3000.0,
                    5.0,
                );

                ui.separator();
                ui.label("Branching");
                Self::labeled_drag_f64(
                    ui,
                    "branching rate:",
                    &mut self.rates.branching_rate,
                    0.0..=5.0,
                    0.05,
                );
                let mut whole_node = self.trigger == BranchingTrigger::WholeNodeCrossing;
                if ui
                    .checkbox(&mut whole_node, "branch on whole-node crossing")
                    .changed()
                {
                    self.trigger = if whole_node {
                        BranchingTrigger::WholeNodeCrossing
                    } else {
                        BranchingTrigger::DailyIncrement
                    };
                }

                ui.separator();
                ui.label("Mortality (/d)");
                Self::labeled_drag_f64(
                    ui,
                    "drought:",
                    &mut self.rates.drought_branch_mortality,
                    0.0..=1.0,
                    0.005,
                );
                Self::labeled_drag_f64(
                    ui,
                    "shade:",
                    &mut self.rates.shade_branch_mortality,
                    0.0..=1.0,
                    0.005,
                );
                let mut plant_mortality_on = self.rates.plant_mortality.is_some();
                if ui
                    .checkbox(&mut plant_mortality_on, "plant mortality")
                    .changed()
                {
                    self.rates.plant_mortality = plant_mortality_on.then_some(0.0);
                }
                if let Some(rate) = self.rates.plant_mortality.as_mut() {
                    Self::labeled_drag_f64(ui, "plants:", rate, 0.0..=1.0, 0.001);
                }

                ui.separator();
                ui.label("Sowing");
                Self::labeled_drag_f64(
                    ui,
                    "population (/m²):",
                    &mut self.sowing.population,
                    0.0..=1000.0,
                    1.0,
                );
                Self::labeled_drag_f64(
                    ui,
                    "bud number:",
                    &mut self.sowing.bud_number,
                    0.0..=4.0,
                    0.1,
                );
                Self::labeled_drag_f64(
                    ui,
                    "max cover:",
                    &mut self.sowing.max_cover,
                    0.0..=1.0,
                    0.01,
                );

                ui.separator();
                ui.label("Weather");
                Self::labeled_drag_f64(
                    ui,
                    "mean T (°C):",
                    &mut self.weather.mean_temperature,
                    -10.0..=40.0,
                    0.5,
                );
                Self::labeled_drag_f64(
                    ui,
                    "± T (°C):",
                    &mut self.weather.amplitude,
                    0.0..=20.0,
                    0.5,
                );
                Self::labeled_drag_f64(
                    ui,
                    "base T (°C):",
                    &mut self.weather.base_temperature,
                    -5.0..=15.0,
                    0.5,
                );

                ui.separator();
                ui.label("Series");
                for (i, series) in Series::ALL.iter().enumerate() {
                    ui.checkbox(&mut self.visible[i], series.label());
                }

                ui.separator();
                if ui.button("Reset parameters to default").clicked() {
                    self.rates = RateParameters {
                        height: 800.0,
                        ..RateParameters::default()
                    };
                    self.weather = Weather::default();
                }
            });
    }

    /// Builds the central panel with the time-series plot.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            if response.dragged() {
                self.pan += response.drag_delta();
            }

            // Axes.
            let axis = egui::Stroke::new(1.0, egui::Color32::DARK_GRAY);
            let origin = self.world_to_screen(Vec2::ZERO, rect);
            painter.line_segment([origin, egui::pos2(rect.right(), origin.y)], axis);
            painter.line_segment([origin, egui::pos2(origin.x, rect.top())], axis);

            // Final-node reference line.
            let final_node = self.structure.main_stem_final_node_number() as f32;
            let y = self.world_to_screen(Vec2::new(0.0, final_node), rect).y;
            let guide = egui::Color32::from_rgba_unmultiplied(120, 200, 120, 64);
            painter.line_segment(
                [egui::pos2(origin.x, y), egui::pos2(rect.right(), y)],
                egui::Stroke::new(1.0, guide),
            );

            for (i, series) in Series::ALL.iter().enumerate() {
                if !self.visible[i] || self.history.len() < 2 {
                    continue;
                }
                let points: Vec<egui::Pos2> = self
                    .history
                    .iter()
                    .map(|r| {
                        let p = Vec2::new(r.day as f32, series.value(r) as f32);
                        self.world_to_screen(p, rect)
                    })
                    .collect();
                painter.add(egui::Shape::line(
                    points,
                    egui::Stroke::new(1.5, series.color()),
                ));
            }

            // Legend.
            let mut legend_pos = rect.left_top() + egui::vec2(50.0, 10.0);
            for (i, series) in Series::ALL.iter().enumerate() {
                if !self.visible[i] {
                    continue;
                }
                painter.text(
                    legend_pos,
                    egui::Align2::LEFT_TOP,
                    series.label(),
                    egui::FontId::proportional(13.0),
                    series.color(),
                );
                legend_pos.y += 16.0;
            }

            // Hover readout.
            if let Some(pointer) = response.hover_pos() {
                let w = self.screen_to_world(pointer, rect);
                painter.text(
                    pointer + egui::vec2(12.0, -12.0),
                    egui::Align2::LEFT_BOTTOM,
                    format!("day {:.0}, {:.2}", w.x, w.y),
                    egui::FontId::monospace(12.0),
                    egui::Color32::YELLOW,
                );
            }

            if self.running {
                let now = ctx.input(|i| i.time);
                let elapsed = now - self.last_step_time;
                if elapsed >= self.step_interval {
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = elapsed;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }
                if self.structure.season() != Season::Active {
                    self.running = false;
                }

                ctx.request_repaint();
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}
