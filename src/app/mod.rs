use std::cell::Cell;
use std::collections::HashSet;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use checkin_graph::Attribute;
use checkin_graph::data::{UserGraph, load_user_graph};
use checkin_graph::layout::{FilterThresholds, SimulationContext};
use eframe::egui::{self, Context, Pos2, Vec2};

use crate::LayoutOptions;

mod graph;
mod render_utils;
mod ui;

pub struct CheckinGraphApp {
    data_path: PathBuf,
    options: LayoutOptions,
    state: AppState,
}

enum AppState {
    Loading {
        rx: Receiver<Result<UserGraph, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    context: SimulationContext,
    hub_threshold: f32,
    search: String,
    selected: Option<usize>,
    pan: Vec2,
    zoom: f32,
    live_physics: bool,
    show_quadtree_overlay: bool,
    show_hub_labels: bool,
    filter_inputs: FilterInputs,
    dragging: Option<usize>,
    tick_count: Rc<Cell<u64>>,
    search_match_cache: Option<SearchMatchCache>,
    engaged_cache: Option<EngagedCache>,
    view_scratch: ViewScratch,
}

/// One threshold slider. Disabled sliders contribute no bound to the filter.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ThresholdInput {
    enabled: bool,
    value: f32,
    max: f32,
}

impl ThresholdInput {
    fn new(applied: Option<f32>, max: f32) -> Self {
        Self {
            enabled: applied.is_some(),
            value: applied.unwrap_or(max),
            max,
        }
    }

    fn clear(&mut self) {
        self.enabled = false;
        self.value = self.max;
    }
}

/// Slider state for the three thresholds, kept apart from what is applied.
#[derive(Clone, Debug, PartialEq)]
struct FilterInputs {
    connections: ThresholdInput,
    duration: ThresholdInput,
    frequency: ThresholdInput,
}

impl FilterInputs {
    fn new(applied: Option<FilterThresholds>, maxima: impl Fn(Attribute) -> f32) -> Self {
        let input = |attribute| {
            ThresholdInput::new(
                applied.and_then(|thresholds| thresholds.get(attribute)),
                maxima(attribute),
            )
        };
        Self {
            connections: input(Attribute::Connections),
            duration: input(Attribute::Duration),
            frequency: input(Attribute::Frequency),
        }
    }

    fn get_mut(&mut self, attribute: Attribute) -> &mut ThresholdInput {
        match attribute {
            Attribute::Connections => &mut self.connections,
            Attribute::Duration => &mut self.duration,
            Attribute::Frequency => &mut self.frequency,
        }
    }

    fn thresholds(&self) -> FilterThresholds {
        let bound = |input: ThresholdInput| input.enabled.then_some(input.value);
        FilterThresholds {
            connections: bound(self.connections),
            duration: bound(self.duration),
            frequency: bound(self.frequency),
        }
    }

    fn clear(&mut self) {
        for attribute in Attribute::ALL {
            self.get_mut(attribute).clear();
        }
    }
}

struct SearchMatchCache {
    query: String,
    ranked: Vec<usize>,
    matches: Arc<HashSet<usize>>,
}

struct EngagedCache {
    thresholds: Option<FilterThresholds>,
    users: Vec<usize>,
}

#[derive(Default)]
struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
    visible_indices: Vec<usize>,
    quadtree_positions: Vec<Vec2>,
}

impl CheckinGraphApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        data_path: PathBuf,
        options: LayoutOptions,
    ) -> Self {
        let state = Self::start_load(data_path.clone());
        Self {
            data_path,
            options,
            state,
        }
    }

    fn spawn_load(data_path: PathBuf) -> Receiver<Result<UserGraph, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_user_graph(&data_path).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(data_path: PathBuf) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(data_path),
        }
    }
}

impl eframe::App for CheckinGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(graph) => {
                            let context = self.options.build_context(graph);
                            AppState::Ready(Box::new(ViewModel::new(context)))
                        }
                        Err(error) => {
                            log::error!("loading {} failed: {error}", self.data_path.display());
                            AppState::Error(error)
                        }
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading check-in dataset...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the check-in dataset");
                    ui.add_space(6.0);
                    ui.label(format!("file: {}", self.data_path.display()));
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.data_path.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                model.show(ctx, &self.data_path, &mut reload_requested);
                if reload_requested {
                    transition = Some(Self::start_load(self.data_path.clone()));
                }
            }
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }
}
