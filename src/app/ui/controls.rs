use std::collections::HashSet;
use std::sync::Arc;

use checkin_graph::Attribute;
use checkin_graph::layout::cluster_color;
use eframe::egui::{self, Key, Response, RichText, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::super::{SearchMatchCache, ViewModel};

const ARROW_STEPS_PER_SEC: f32 = 10.0;
const ARROW_MAX_BOOST: f32 = 40.0;
const SEARCH_RESULT_ROWS: usize = 12;

/// Seconds an arrow key has been held on a focused slider, signed by direction.
#[derive(Clone, Copy, Default)]
struct ArrowHold {
    direction: i8,
    seconds: f32,
}

fn arrow_boost(seconds: f32) -> f32 {
    let ramp = seconds * 9.0;
    (1.0 + ramp + 0.15 * ramp * ramp).min(ARROW_MAX_BOOST)
}

/// Holding an arrow key on a wide threshold slider speeds up the longer it is held.
fn accelerate_with_arrows(ui: &Ui, response: &Response, value: &mut f32, max: f32, step: f32) {
    let id = response.id.with("arrow_hold");
    if !response.has_focus() {
        ui.ctx().data_mut(|data| data.remove::<ArrowHold>(id));
        return;
    }

    let (dt, direction) = ui.input(|input| {
        let up = input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp);
        let down = input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown);
        (input.stable_dt.min(0.1), up as i8 - down as i8)
    });

    let previous = ui
        .ctx()
        .data(|data| data.get_temp::<ArrowHold>(id))
        .unwrap_or_default();
    let hold = ArrowHold {
        direction,
        seconds: if direction != 0 && direction == previous.direction {
            previous.seconds + dt
        } else {
            0.0
        },
    };
    ui.ctx().data_mut(|data| data.insert_temp(id, hold));
    if direction == 0 {
        return;
    }

    let delta = f32::from(direction) * step * ARROW_STEPS_PER_SEC * arrow_boost(hold.seconds) * dt;
    *value = (*value + delta).clamp(0.0, max);
    ui.ctx().request_repaint();
}

fn threshold_slider(ui: &mut Ui, value: &mut f32, max: f32, step: f64, label: &str) {
    let response = ui.add(
        egui::Slider::new(&mut *value, 0.0..=max)
            .step_by(step)
            .text(label)
            .clamping(egui::SliderClamping::Always),
    );
    if response.hovered() {
        response.request_focus();
    }
    accelerate_with_arrows(ui, &response, value, max, step as f32);
}

impl ViewModel {
    /// Fuzzy id matches for the current query, best first.
    pub(in crate::app) fn search_matches(&mut self) -> Arc<HashSet<usize>> {
        let query = self.search.trim();
        if query.is_empty() {
            self.search_match_cache = None;
            return Arc::default();
        }

        if let Some(cached) = &self.search_match_cache
            && cached.query == query
        {
            return Arc::clone(&cached.matches);
        }

        let matcher = SkimMatcherV2::default();
        let mut scored = self
            .context
            .nodes()
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                matcher
                    .fuzzy_match(&node.id.to_string(), query)
                    .map(|score| (index, score))
            })
            .collect::<Vec<_>>();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let matches = Arc::new(scored.iter().map(|(index, _)| *index).collect::<HashSet<_>>());
        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            ranked: scored
                .into_iter()
                .take(SEARCH_RESULT_ROWS)
                .map(|(index, _)| index)
                .collect(),
            matches: Arc::clone(&matches),
        });
        matches
    }

    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search user id")
            .on_hover_text("Fuzzy-highlight matching users; click a result to select it.");
        ui.text_edit_singleline(&mut self.search);
        self.search_matches();
        let ranked = self
            .search_match_cache
            .as_ref()
            .map(|cache| cache.ranked.clone())
            .unwrap_or_default();
        for index in ranked {
            let node = &self.context.nodes()[index];
            let label = format!("user {}  ({} connections)", node.id, node.connection_count());
            if ui.link(label).clicked() {
                self.set_selected(Some(index));
            }
        }

        ui.separator();
        ui.label(RichText::new("Filter").strong())
            .on_hover_text("Keep users at or below any of the three thresholds.");
        for (attribute, label) in [
            (Attribute::Connections, "Connections"),
            (Attribute::Duration, "Duration (h)"),
            (Attribute::Frequency, "Check-ins"),
        ] {
            let input = self.filter_inputs.get_mut(attribute);
            ui.horizontal(|ui| {
                ui.checkbox(&mut input.enabled, "");
                ui.add_enabled_ui(input.enabled, |ui| {
                    threshold_slider(ui, &mut input.value, input.max, 1.0, label);
                });
            });
        }
        let thresholds = self.filter_inputs.thresholds();
        if ui
            .add_enabled(!thresholds.is_empty(), egui::Button::new("Apply filter"))
            .on_disabled_hover_text("Enable at least one threshold.")
            .clicked()
        {
            self.context.set_filter_thresholds(thresholds);
        }

        ui.separator();
        ui.label(RichText::new("Cluster by").strong());
        ui.horizontal_wrapped(|ui| {
            let current = self.context.clustering().map(|assignment| assignment.attribute);
            for attribute in Attribute::ALL {
                if ui
                    .selectable_label(current == Some(attribute), attribute.label())
                    .clicked()
                {
                    self.context.set_cluster_attribute(attribute);
                }
            }
        });

        if ui
            .button("Reset view")
            .on_hover_text("Show every user and link again and drop clusters.")
            .clicked()
        {
            self.context.reset_view();
            self.filter_inputs.clear();
        }

        ui.separator();
        ui.checkbox(&mut self.live_physics, "Live physics simulation")
            .on_hover_text("Step the layout every frame until it settles.");
        if ui.button("Reheat layout").clicked() {
            self.context.reheat(1.0);
        }
        ui.checkbox(&mut self.show_quadtree_overlay, "Show quadtree overlay")
            .on_hover_text("Draw the spatial index partitions over the graph canvas.");
        ui.checkbox(&mut self.show_hub_labels, "Label hubs")
            .on_hover_text(format!(
                "Show connection counts on users with at least {:.0} connections.",
                self.hub_threshold
            ));

        self.draw_cluster_densities(ui);
    }

    fn draw_cluster_densities(&self, ui: &mut Ui) {
        let Some(assignment) = self.context.clustering() else {
            return;
        };

        ui.separator();
        ui.label(RichText::new(format!("Clusters by {}", assignment.attribute)).strong());
        for cluster in &assignment.clusters {
            ui.horizontal(|ui| {
                let (swatch, _) = ui.allocate_exact_size(vec2(12.0, 12.0), egui::Sense::hover());
                ui.painter()
                    .rect_filled(swatch, 2.0, cluster_color(cluster.key));
                ui.label(format!(
                    "Cluster {}: {} users, density {:.2}",
                    cluster.key + 1,
                    cluster.members.len(),
                    cluster.density
                ));
            });
        }
    }
}
