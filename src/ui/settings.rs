use egui::Color32;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use turnweaver::model::message::MessageKind;

#[derive(Serialize, Deserialize, Clone)]
pub struct UiSettings {
    pub ui_scale: f32,

    // Message kind label → color
    pub kind_colors: HashMap<String, [u8; 4]>,
}

impl Default for UiSettings {
    fn default() -> Self {
        let mut kind_colors = HashMap::new();

        kind_colors.insert(MessageKind::User.label().into(), [40, 70, 120, 255]);
        kind_colors.insert(MessageKind::Narrator.label().into(), [40, 90, 60, 255]);
        kind_colors.insert(MessageKind::System.label().into(), [80, 80, 80, 255]);
        kind_colors.insert(MessageKind::Error.label().into(), [140, 40, 40, 255]);

        Self {
            ui_scale: 1.0,
            kind_colors,
        }
    }
}

impl UiSettings {
    pub fn color(&self, kind: MessageKind) -> Color32 {
        self.kind_colors
            .get(kind.label())
            .map(|c| Color32::from_rgba_unmultiplied(c[0], c[1], c[2], c[3]))
            .unwrap_or(Color32::DARK_GRAY)
    }
}
