use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use checkin_graph::Attribute;
use checkin_graph::layout::SimulationContext;
use eframe::egui::{self, Align, Context, Layout, Vec2};

use super::super::{FilterInputs, ViewModel, ViewScratch};

impl ViewModel {
    pub(in crate::app) fn new(mut context: SimulationContext) -> Self {
        let hub_threshold = context.graph().hub_threshold();
        let graph = context.graph();
        let max_of = |attribute: Attribute| {
            graph
                .top_by(attribute)
                .map_or(0.0, |node| attribute.value(node))
                .max(1.0)
        };
        let filter_inputs = FilterInputs::new(context.thresholds().copied(), max_of);

        let tick_count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&tick_count);
        context.on_step(Box::new(move |_frame| counter.set(counter.get() + 1)));

        Self {
            context,
            hub_threshold,
            search: String::new(),
            selected: None,
            pan: Vec2::ZERO,
            zoom: 0.6,
            live_physics: true,
            show_quadtree_overlay: false,
            show_hub_labels: true,
            filter_inputs,
            dragging: None,
            tick_count,
            search_match_cache: None,
            engaged_cache: None,
            view_scratch: ViewScratch::default(),
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        data_path: &Path,
        reload_requested: &mut bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("checkin-graph");
                    ui.separator();
                    ui.label(format!("data: {}", data_path.display()));
                    ui.label(format!("users: {}", self.context.graph().node_count()));
                    ui.label(format!("links: {}", self.context.graph().link_count()));
                    if ui.button("Reload data").clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let state = if self.context.is_settled() {
                            "settled"
                        } else {
                            "running"
                        };
                        ui.label(format!(
                            "{state}  |  alpha {:.3}  |  ticks {}  |  active {}",
                            self.context.simulation().alpha(),
                            self.tick_count.get(),
                            self.context.active_nodes().len()
                        ));
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<usize>) {
        if self.selected == selected {
            return;
        }
        self.selected = selected;
    }
}
