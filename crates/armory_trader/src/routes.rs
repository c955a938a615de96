//! Image route keys. The host's file server asks for avatars under keys that
//! vary between client builds, so every plausible key is registered.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

pub const QUEST_ICON_PREFIX: &str = "/files/quest/icon/";
const QUEST_ROOT: &[&str] = &["db", "CustomQuests"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Route keys for a trader avatar: the configured route without its
/// extension, the route as configured, and the bare file stem.
pub fn avatar_routes(avatar: &str) -> Vec<String> {
    let avatar = avatar.trim();
    let mut routes: Vec<String> = Vec::with_capacity(3);
    let mut push = |route: &str| {
        if !route.is_empty() && !routes.iter().any(|r| r == route) {
            routes.push(route.to_string());
        }
    };

    push(strip_extension(avatar));
    push(avatar);
    let file = avatar.rsplit('/').next().unwrap_or(avatar);
    push(strip_extension(file));
    routes
}

fn strip_extension(route: &str) -> &str {
    let file_start = route.rfind('/').map_or(0, |i| i + 1);
    match route[file_start..].rfind('.') {
        Some(dot) if dot > 0 => &route[..file_start + dot],
        _ => route,
    }
}

/// Every quest image under `db/CustomQuests/**/Images/`, keyed by the route
/// the client requests it under. Sorted by path.
pub fn quest_icon_routes(mod_root: &Path) -> Vec<(String, PathBuf)> {
    let root = QUEST_ROOT.iter().fold(mod_root.to_path_buf(), |p, c| p.join(c));
    if !root.is_dir() {
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(&root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| is_image(path) && in_images_dir(&root, path))
        .collect();
    files.sort();

    files
        .into_iter()
        .filter_map(|path| {
            let stem = path.file_stem()?.to_string_lossy().into_owned();
            Some((format!("{QUEST_ICON_PREFIX}{stem}"), path))
        })
        .collect()
}

fn is_image(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        IMAGE_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known))
    })
}

fn in_images_dir(root: &Path, path: &Path) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    relative
        .parent()
        .is_some_and(|dir| dir.iter().any(|c| c.eq_ignore_ascii_case("images")))
}
