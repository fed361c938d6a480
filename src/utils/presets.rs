/// One-click style presets for image-to-image generation.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub key: &'static str,
    pub title: &'static str,
    pub prompt: &'static str,
    pub preview_url: &'static str,
}

const PRESETS: &[Preset] = &[
    Preset {
        key: "cinema",
        title: "Cinematic portrait",
        prompt: "cinematic portrait, soft light, 35mm, dramatic mood",
        preview_url: "https://picsum.photos/seed/cinema/512/512",
    },
    Preset {
        key: "anime",
        title: "Anime",
        prompt: "anime style, clean lines, soft shading, vivid colors",
        preview_url: "https://picsum.photos/seed/anime/512/512",
    },
    Preset {
        key: "cyberpunk",
        title: "Cyberpunk",
        prompt: "cyberpunk, neon, night city, reflections, high contrast",
        preview_url: "https://picsum.photos/seed/cyberpunk/512/512",
    },
    Preset {
        key: "vintage",
        title: "Vintage photo",
        prompt: "vintage photograph, grain, warm tones, retro",
        preview_url: "https://picsum.photos/seed/vintage/512/512",
    },
    Preset {
        key: "pixel",
        title: "Pixel art",
        prompt: "pixel art, 16-bit, crisp pixels, retro game",
        preview_url: "https://picsum.photos/seed/pixel/512/512",
    },
    Preset {
        key: "watercolor",
        title: "Watercolor",
        prompt: "watercolor illustration, soft gradients, light splashes",
        preview_url: "https://picsum.photos/seed/watercolor/512/512",
    },
];

pub fn list_presets() -> &'static [Preset] {
    PRESETS
}

pub fn get_preset(key: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|preset| preset.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_preset() {
        assert_eq!(get_preset("anime").unwrap().title, "Anime");
        assert!(get_preset("unknown").is_none());
    }
}
