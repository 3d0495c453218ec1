use eframe::egui::{self, Pos2, Rect, Ui};

use super::super::ViewModel;
use super::super::render_utils::screen_to_world;

const ZOOM_PER_SCROLL_POINT: f32 = 0.0015;
const MIN_ZOOM: f32 = 0.05;
const MAX_ZOOM: f32 = 8.0;

impl ViewModel {
    /// Scroll or pinch zooms around the pointer so the user under it stays put.
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let (scroll, pinch, pointer) = ui.input(|input| {
            (
                input.smooth_scroll_delta.y,
                input.zoom_delta(),
                input.pointer.hover_pos(),
            )
        });
        let factor = pinch * (scroll * ZOOM_PER_SCROLL_POINT).exp();
        if (factor - 1.0).abs() <= f32::EPSILON {
            return;
        }

        let anchor = pointer.unwrap_or_else(|| rect.center());
        let world = screen_to_world(rect, self.pan, self.zoom, anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = anchor - rect.center() - world * self.zoom;
    }

    /// Secondary or middle drag pans; so does a primary drag that did not grab a user.
    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        let panning = response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
            || (response.dragged_by(egui::PointerButton::Primary) && self.dragging.is_none());
        if panning {
            self.pan += response.drag_delta();
        }
    }

    /// Primary-button drag moves a node through the simulation's pin bridge.
    pub(in crate::app) fn handle_node_drag(
        &mut self,
        rect: Rect,
        response: &egui::Response,
        hovered: Option<usize>,
    ) {
        let pointer_world = response
            .interact_pointer_pos()
            .map(|pointer| screen_to_world(rect, self.pan, self.zoom, pointer));

        if response.drag_started_by(egui::PointerButton::Primary)
            && let (Some(index), Some(position)) = (hovered, pointer_world)
        {
            let id = self.context.nodes()[index].id.clone();
            match self.context.drag_start(&id, position) {
                Ok(true) => self.dragging = Some(index),
                Ok(false) => {}
                Err(error) => log::warn!("drag start rejected: {error}"),
            }
        }

        let Some(index) = self.dragging else {
            return;
        };
        let id = self.context.nodes()[index].id.clone();

        if response.dragged_by(egui::PointerButton::Primary)
            && let Some(position) = pointer_world
            && let Err(error) = self.context.drag_move(&id, position)
        {
            log::warn!("drag move rejected: {error}");
        }

        if response.drag_stopped() || self.context.dragging() != Some(index) {
            if let Err(error) = self.context.drag_end(&id) {
                log::warn!("drag end rejected: {error}");
            }
            self.dragging = None;
        }
    }

    pub(in crate::app) fn hovered_index(
        ui: &Ui,
        visible_indices: &[usize],
        screen_positions: &[Pos2],
        screen_radii: &[f32],
    ) -> Option<usize> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        visible_indices
            .iter()
            .filter_map(|&index| {
                let distance = screen_positions[index].distance(pointer);
                (distance <= screen_radii[index].max(4.0)).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }
}
