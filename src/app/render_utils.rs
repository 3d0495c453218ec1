use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

pub(super) const CANVAS_COLOR: Color32 = Color32::BLACK;
pub(super) const DEFAULT_NODE_COLOR: Color32 = Color32::from_rgb(0xeb, 0x5e, 0x28);
pub(super) const FILTERED_COLOR: Color32 = Color32::from_rgb(0xfd, 0x85, 0x08);
pub(super) const HIDDEN_NODE_COLOR: Color32 = Color32::BLACK;
pub(super) const HUB_RING_COLOR: Color32 = Color32::from_rgb(0xdc, 0x5f, 0x00);
pub(super) const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
pub(super) const LINK_COLOR: Color32 = Color32::from_rgba_premultiplied(90, 90, 90, 110);

/// Fill the canvas and outline the area cluster anchors are drawn from.
pub(super) fn draw_canvas(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32, anchor_area: Vec2) {
    painter.rect_filled(rect, 0.0, CANVAS_COLOR);

    let half = anchor_area * 0.5;
    let frame = Rect::from_two_pos(
        world_to_screen(rect, pan, zoom, -half),
        world_to_screen(rect, pan, zoom, half),
    );
    painter.rect_stroke(
        frame,
        4.0,
        Stroke::new(1.0, Color32::from_gray(38)),
        eframe::egui::StrokeKind::Middle,
    );
}

pub(super) fn tint(base: Color32, toward: Color32, amount: f32) -> Color32 {
    base.lerp_to_gamma(toward, amount.clamp(0.0, 1.0))
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    rect.expand(radius).contains(position)
}

pub(super) fn segment_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    Rect::from_two_pos(start, end)
        .expand(padding)
        .intersects(rect)
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

/// Node radii are world units; keep them clickable when zoomed far out.
pub(super) fn screen_radius(world_radius: f32, zoom: f32) -> f32 {
    (world_radius * zoom).clamp(1.0, 80.0)
}
