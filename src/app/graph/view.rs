use checkin_graph::data::UserGraph;
use checkin_graph::layout::SpatialIndex;
use eframe::egui::{self, Align2, Color32, FontId, Sense, Stroke, Ui, vec2};

use super::super::ViewModel;
use super::super::render_utils::{
    DEFAULT_NODE_COLOR, FILTERED_COLOR, HIDDEN_NODE_COLOR, HUB_RING_COLOR, LINK_COLOR,
    SELECTED_COLOR, circle_visible, draw_canvas, screen_radius, segment_visible, tint,
    world_to_screen,
};

impl ViewModel {
    fn update_screen_space(&mut self, rect: egui::Rect) {
        let scratch = &mut self.view_scratch;
        scratch.screen_positions.clear();
        scratch.screen_radii.clear();
        scratch.visible_indices.clear();

        for (index, node) in self.context.nodes().iter().enumerate() {
            let position = world_to_screen(rect, self.pan, self.zoom, node.position);
            let radius = if self.context.passes_filter(index) {
                screen_radius(node.radius, self.zoom)
            } else {
                1.0
            };
            scratch.screen_positions.push(position);
            scratch.screen_radii.push(radius);
            if circle_visible(rect, position, radius) {
                scratch.visible_indices.push(index);
            }
        }
    }

    fn draw_quadtree_overlay(&mut self, painter: &egui::Painter, rect: egui::Rect) {
        let positions = &mut self.view_scratch.quadtree_positions;
        positions.clear();
        positions.extend(
            self.context
                .active_nodes()
                .iter()
                .map(|&index| self.context.nodes()[index].position),
        );

        for cell in SpatialIndex::build(positions).cells() {
            let min = cell.center - vec2(cell.half_extent, cell.half_extent);
            let max = cell.center + vec2(cell.half_extent, cell.half_extent);
            let top_left = world_to_screen(rect, self.pan, self.zoom, min);
            let bottom_right = world_to_screen(rect, self.pan, self.zoom, max);

            let alpha = if cell.is_leaf { 110 } else { 55 };
            let line_width = (1.4_f32 - (cell.depth as f32 * 0.09)).clamp(0.45, 1.4);
            painter.rect_stroke(
                egui::Rect::from_two_pos(top_left, bottom_right),
                0.0,
                Stroke::new(line_width, Color32::from_rgba_unmultiplied(106, 198, 255, alpha)),
                egui::StrokeKind::Middle,
            );
        }
    }

    fn node_color(&self, index: usize) -> Color32 {
        let node = &self.context.nodes()[index];
        if let Some(color) = node.color {
            return color;
        }
        if !self.context.is_filtered() {
            DEFAULT_NODE_COLOR
        } else if self.context.passes_filter(index) {
            FILTERED_COLOR
        } else {
            HIDDEN_NODE_COLOR
        }
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_canvas(
            &painter,
            rect,
            self.pan,
            self.zoom,
            self.context.simulation().config().canvas,
        );
        self.handle_graph_zoom(ui, rect, &response);

        if self.live_physics && !self.context.is_settled() {
            self.context.tick();
            ui.ctx().request_repaint();
        }

        self.update_screen_space(rect);
        if self.show_quadtree_overlay {
            self.draw_quadtree_overlay(&painter, rect);
        }

        let hovered = Self::hovered_index(
            ui,
            &self.view_scratch.visible_indices,
            &self.view_scratch.screen_positions,
            &self.view_scratch.screen_radii,
        );
        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }
        self.handle_node_drag(rect, &response, hovered);
        self.handle_graph_pan(&response);
        if self.dragging.is_some() {
            ui.ctx().request_repaint();
        }

        let zoom_sqrt = self.zoom.sqrt();
        if self.context.links_visible() {
            let stroke = Stroke::new((0.9 * zoom_sqrt).clamp(0.4, 2.4), LINK_COLOR);
            for link in self.context.active_links() {
                if !self.context.passes_filter(link.source)
                    || !self.context.passes_filter(link.target)
                {
                    continue;
                }
                let start = self.view_scratch.screen_positions[link.source];
                let end = self.view_scratch.screen_positions[link.target];
                if segment_visible(rect, start, end, 2.0) {
                    painter.line_segment([start, end], stroke);
                }
            }
        }

        let search_matches = self.search_matches();
        for &index in &self.view_scratch.visible_indices {
            let node = &self.context.nodes()[index];
            let position = self.view_scratch.screen_positions[index];
            let radius = self.view_scratch.screen_radii[index];
            let is_selected = self.selected == Some(index);
            let is_hovered = hovered == Some(index);
            let is_match = search_matches.contains(&index);
            let is_hub = self.context.passes_filter(index)
                && UserGraph::is_hub(node, self.hub_threshold);

            let mut color = self.node_color(index);
            if is_hovered {
                color = tint(color, Color32::WHITE, 0.35);
            } else if is_match {
                color = tint(color, Color32::from_rgb(103, 196, 255), 0.68);
            }
            if is_selected {
                color = SELECTED_COLOR;
            }

            painter.circle_filled(position, radius, color);
            if is_hub && self.context.links_visible() {
                painter.circle_stroke(position, radius + 2.0, Stroke::new(1.4, HUB_RING_COLOR));
                if self.show_hub_labels {
                    painter.text(
                        position + vec2(radius + 4.0, 0.0),
                        Align2::LEFT_CENTER,
                        node.connection_count().to_string(),
                        FontId::proportional(11.0),
                        Color32::from_gray(230),
                    );
                }
            }
            if is_selected {
                painter.circle_stroke(
                    position,
                    radius + 4.0,
                    Stroke::new(1.6, Color32::from_rgba_unmultiplied(245, 206, 93, 160)),
                );
            }
        }

        if let Some(index) = hovered {
            let node = &self.context.nodes()[index];
            let text = format!(
                "user {}  |  connections {}  |  duration {:.2} h  |  check-ins {}",
                node.id,
                node.connection_count(),
                node.check_in_duration,
                node.check_in_frequency
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            self.set_selected(hovered);
        }
    }
}
