use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use captutor_core::{
    FileStore, ItemKind, ItemPath, ItemStore, format_listing,
    sanitize::{file_base_name, names_match},
};
use console::style;

type Store = ItemStore<FileStore>;

/// Turn "Physics/Optics" into an index path, matching folder names case-insensitively.
fn resolve_folder_path(store: &Store, path: Option<&str>) -> Result<ItemPath> {
    let mut current = ItemPath::new();
    for segment in path.unwrap_or_default().split('/').filter(|s| !s.trim().is_empty()) {
        let index = store
            .list(&current)?
            .into_iter()
            .find(|(_, node)| node.is_folder() && names_match(&node.name, segment.trim()))
            .map(|(index, _)| index)
            .ok_or_else(|| anyhow!("no folder named \"{}\"", segment.trim()))?;
        current.push(index);
    }
    Ok(current)
}

fn done(msg: impl std::fmt::Display) {
    println!("{} {}", style("✓").green().bold(), msg);
}

pub fn list(store: &Store, path: Option<&str>) -> Result<()> {
    let folder_path = resolve_folder_path(store, path)?;
    let folder = store.tree().resolve_folder(&folder_path)?;
    let listing = format_listing(store.tree(), folder);
    if listing.is_empty() {
        println!("{}", style("(empty)").dim());
    } else {
        println!("{}", listing);
    }
    Ok(())
}

pub fn mkdir(store: &mut Store, parent: Option<&str>, name: &str) -> Result<()> {
    let parent_path = resolve_folder_path(store, parent)?;
    let id = store.create_folder(&parent_path, name)?;
    let created = store.node(id).map(|n| n.name.clone()).unwrap_or_default();
    done(format!("Created folder {}", style(created).bold()));
    Ok(())
}

pub fn save(
    store: &mut Store,
    parent: Option<&str>,
    title: &str,
    video_id: Option<String>,
    caption_file: &Path,
) -> Result<()> {
    let text = std::fs::read_to_string(caption_file)
        .with_context(|| format!("could not read {}", caption_file.display()))?;
    let captions: Vec<String> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    if captions.is_empty() {
        bail!("{} holds no captions", caption_file.display());
    }

    let parent_path = resolve_folder_path(store, parent)?;
    let id = store.save_transcript(&parent_path, title, &captions, video_id)?;
    let saved = store.node(id).map(|n| n.name.clone()).unwrap_or_default();
    done(format!(
        "Saved {} {}",
        style(saved).bold(),
        style(format!("({} captions)", captions.len())).dim()
    ));
    Ok(())
}

pub fn rename(
    store: &mut Store,
    parent: Option<&str>,
    index: usize,
    new_name: &str,
    kind: ItemKind,
) -> Result<()> {
    let parent_path = resolve_folder_path(store, parent)?;
    store.rename_item(&parent_path, index, new_name, kind)?;
    let mut path = parent_path;
    path.push(index);
    done(format!("Renamed to {}", style(&store.resolve(&path)?.name).bold()));
    Ok(())
}

pub fn remove(store: &mut Store, parent: Option<&str>, index: usize) -> Result<()> {
    let parent_path = resolve_folder_path(store, parent)?;
    let removed = store.delete_item(&parent_path, index)?;
    done(format!("Deleted {}", style(removed.name()).bold()));
    Ok(())
}

pub fn files(store: &Store, path: &str) -> Result<()> {
    let folder_path = resolve_folder_path(store, Some(path))?;
    let files = store.collect_files(&folder_path)?;
    if files.is_empty() {
        println!("{}", style("This folder and its subfolders are empty.").dim());
    }
    for node in files {
        let words = node.content().map_or(0, |c| c.split_whitespace().count());
        println!(
            "{}  {}",
            file_base_name(&node.name),
            style(format!("{} words", words)).dim()
        );
    }
    Ok(())
}

pub fn list_chats(store: &Store) -> Result<()> {
    if store.chats().is_empty() {
        println!("{}", style("No chats yet. Use `captutor learn URL`.").dim());
    }
    for chat in store.chats() {
        println!("{}  {}", chat.name, style(&chat.video_id).dim());
    }
    Ok(())
}

pub fn show_chat(store: &Store, name: &str) -> Result<()> {
    let chat = store
        .chat(name)
        .ok_or_else(|| anyhow!("no chat named \"{}\"", name))?;
    println!("{}\n", style(&chat.name).cyan().bold());
    println!("{}", chat.content);
    Ok(())
}

pub fn rename_chat(store: &mut Store, name: &str, new_name: &str) -> Result<()> {
    store.rename_chat(name, new_name)?;
    done("Chat renamed");
    Ok(())
}

pub fn remove_chat(store: &mut Store, name: &str) -> Result<()> {
    if !store.delete_chat(name) {
        bail!("no chat named \"{}\"", name);
    }
    done(format!("Deleted chat {}", style(name).bold()));
    Ok(())
}
