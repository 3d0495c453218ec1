use checkin_graph::Attribute;
use checkin_graph::data::{UserGraph, highly_engaged, peak_check_in_hours};
use eframe::egui::{self, RichText, Ui};

use super::super::{EngagedCache, ViewModel};

const CHECK_IN_PREVIEW_ROWS: usize = 10;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        match self.selected {
            Some(index) => self.draw_selected_user(ui, index),
            None => {
                ui.label("Select a user from the graph, search or rankings.");
            }
        }

        ui.separator();
        ui.label(RichText::new("Top users").strong());
        for attribute in Attribute::ALL {
            let Some(node) = self.context.graph().top_by(attribute) else {
                continue;
            };
            let label = format!(
                "most {}: user {} ({})",
                attribute.label(),
                node.id,
                format_value(attribute, attribute.value(node))
            );
            let index = self.context.graph().index_of(&node.id);
            if ui.link(label).clicked() {
                self.set_selected(index);
            }
        }

        ui.separator();
        ui.label(RichText::new("Highly engaged users").strong())
            .on_hover_text(
                "Users at or above the 75th percentile of both check-ins and duration \
                 within the current view.",
            );
        let engaged = self.engaged_users().to_vec();
        if engaged.is_empty() {
            ui.label("No users in the current view.");
            return;
        }

        egui::ScrollArea::vertical()
            .id_salt("engaged_users_scroll")
            .max_height(260.0)
            .auto_shrink([false, false])
            .show_rows(ui, 20.0, engaged.len(), |ui, row_range| {
                for row in row_range {
                    let index = engaged[row];
                    let node = &self.context.nodes()[index];
                    let label = format!(
                        "user {}  ({} check-ins, {:.1} h)",
                        node.id, node.check_in_frequency, node.check_in_duration
                    );
                    if ui.link(label).clicked() {
                        self.set_selected(Some(index));
                    }
                }
            });
    }

    fn draw_selected_user(&mut self, ui: &mut Ui, index: usize) {
        let Some(node) = self.context.nodes().get(index) else {
            ui.label("Selected user no longer exists in the graph.");
            return;
        };

        ui.label(RichText::new(format!("User {}", node.id)).strong());
        if !self.context.passes_filter(index) {
            ui.small("outside the current filter");
        }
        ui.add_space(6.0);

        ui.label(format!("Connections: {}", node.connection_count()));
        ui.label(format!("Check-in duration: {:.2} h", node.check_in_duration));
        ui.label(format!("Check-ins: {}", node.check_in_frequency));
        if let Some(key) = node.cluster {
            ui.label(format!("Cluster: {}", key + 1));
        }
        if UserGraph::is_hub(node, self.hub_threshold) {
            ui.label(format!(
                "Hub: at or above the 90th percentile ({:.0} connections)",
                self.hub_threshold
            ));
        }

        let peaks = peak_check_in_hours(node);
        if !peaks.is_empty() {
            let hours = peaks
                .iter()
                .map(|hour| format!("{hour:02}:00"))
                .collect::<Vec<_>>()
                .join(", ");
            ui.label(format!("Peak check-in hours (UTC): {hours}"));
        }

        if !node.check_ins.is_empty() {
            ui.add_space(4.0);
            ui.label(RichText::new("First check-ins").strong());
            for check_in in node.check_ins.iter().take(CHECK_IN_PREVIEW_ROWS) {
                ui.small(check_in.format("%Y-%m-%d %H:%M:%S").to_string());
            }
            if node.check_ins.len() > CHECK_IN_PREVIEW_ROWS {
                ui.small(format!(
                    "... and {} more",
                    node.check_ins.len() - CHECK_IN_PREVIEW_ROWS
                ));
            }
        }

        if ui.button("Clear selection").clicked() {
            self.set_selected(None);
        }
    }

    fn engaged_users(&mut self) -> &[usize] {
        let thresholds = self.context.thresholds().copied();
        let stale = self
            .engaged_cache
            .as_ref()
            .is_none_or(|cache| cache.thresholds != thresholds);
        if stale {
            let candidates = self
                .context
                .active_nodes()
                .iter()
                .map(|&index| &self.context.nodes()[index])
                .collect::<Vec<_>>();
            let users = highly_engaged(&candidates)
                .into_iter()
                .filter_map(|node| self.context.graph().index_of(&node.id))
                .collect();
            self.engaged_cache = Some(EngagedCache { thresholds, users });
        }

        self.engaged_cache
            .as_ref()
            .map(|cache| cache.users.as_slice())
            .unwrap_or_default()
    }
}

fn format_value(attribute: Attribute, value: f32) -> String {
    match attribute {
        Attribute::Duration => format!("{value:.2} h"),
        Attribute::Connections | Attribute::Frequency => format!("{value:.0}"),
    }
}
