use crate::{Commands, FavoriteCommand, NoteCommand, PlaybackCommand};
use actim_core::notes::validation::{validate_recording, validate_text};
use actim_core::playback::{calculate_progress, format_time};
use actim_core::{AppContext, NoteDraft, NotePatch, NoteType, StaticCatalog};
use anyhow::{anyhow, bail, Result};
use tracing::info;

pub(crate) async fn run(app: &AppContext, catalog: &StaticCatalog, command: Commands) -> Result<()> {
    match command {
        Commands::Complete { pathway, module } => complete(app, catalog, &pathway, &module).await,
        Commands::Progress { pathway } => progress(app, catalog, pathway.as_deref()).await,
        Commands::Favorite(command) => favorite(app, catalog, command).await,
        Commands::Note(command) => note(app, catalog, command).await,
        Commands::Playback(command) => playback(app, command).await,
        Commands::Events { kind } => {
            let events = match kind {
                Some(kind) => app.analytics.events_by_type(&kind).await,
                None => app.analytics.events().await,
            };
            if events.is_empty() {
                println!("No events recorded yet.");
            }
            for event in events {
                println!("{}", event);
            }
            Ok(())
        }
        Commands::Report => {
            let report = app.analytics.usage_report().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

async fn complete(
    app: &AppContext,
    catalog: &StaticCatalog,
    pathway_id: &str,
    module_id: &str,
) -> Result<()> {
    let pathway = catalog
        .pathway(pathway_id)
        .ok_or_else(|| anyhow!("unknown pathway: {}", pathway_id))?;

    if app.progress.get_progress(pathway_id).await.is_none() {
        app.analytics.track_pathway_start(pathway_id).await;
    }
    let progress = app
        .progress
        .record_module_completion(pathway_id, module_id, &pathway.module_ids)
        .await;
    app.analytics.track_module_complete(module_id, pathway_id).await;
    info!(pathway_id, module_id, "Module completed");

    println!(
        "{}: {}/{} modules ({:.0}%)",
        pathway.name,
        progress.completed_module_ids.len(),
        progress.total_modules,
        progress.progress_percentage * 100.0
    );
    Ok(())
}

async fn progress(app: &AppContext, catalog: &StaticCatalog, only: Option<&str>) -> Result<()> {
    for entry in app.progress.pathways_with_progress(&catalog.pathways).await {
        if only.is_some_and(|id| id != entry.pathway.pathway_id) {
            continue;
        }
        match entry.progress {
            Some(progress) => println!(
                "{:<24} {:>3.0}%  last opened {}",
                entry.pathway.name,
                progress.progress_percentage * 100.0,
                progress.last_accessed.format("%Y-%m-%d %H:%M")
            ),
            None => println!("{:<24}   not started", entry.pathway.name),
        }
    }

    let overall = app.progress.get_overall_progress(&catalog.modules).await;
    println!("Overall: {:.0}%", overall * 100.0);
    Ok(())
}

async fn favorite(app: &AppContext, catalog: &StaticCatalog, command: FavoriteCommand) -> Result<()> {
    match command {
        FavoriteCommand::Toggle { module } => {
            let is_favorite = app.favorites.toggle_favorite(&module).await;
            app.analytics.track_favorite_toggle(&module, is_favorite).await;
            if is_favorite {
                println!("Added {} to favorites", module);
            } else {
                println!("Removed {} from favorites", module);
            }
        }
        FavoriteCommand::List => {
            let items = app.favorites.list_favorites_with_details(&catalog.modules).await;
            if items.is_empty() {
                println!("No favorites yet.");
            }
            for item in items {
                let added = item
                    .added_at
                    .map(|at| at.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                println!("{:<12} {:<32} added {}", item.module_id, item.module.title, added);
            }
        }
    }
    Ok(())
}

async fn note(app: &AppContext, catalog: &StaticCatalog, command: NoteCommand) -> Result<()> {
    match command {
        NoteCommand::Add { module, text } => {
            validate_text(&text)?;
            let notes = app.notes.save_note(NoteDraft::text(&module, text.trim())).await;
            app.analytics.track_note_created(&module, NoteType::Text).await;
            println!("Saved note ({} total)", notes.len());
        }
        NoteCommand::Record {
            module,
            audio_path,
            duration,
            force,
        } => {
            if let Err(e) = validate_recording(Some(audio_path.as_str()), duration) {
                if !(force && e.is_overridable()) {
                    bail!("{}{}", e, if e.is_overridable() { " (use --force to keep it)" } else { "" });
                }
            }
            let notes = app
                .notes
                .save_note(NoteDraft::audio(&module, audio_path, duration))
                .await;
            app.analytics.track_note_created(&module, NoteType::Audio).await;
            println!("Saved audio note ({} total)", notes.len());
        }
        NoteCommand::List { module } => {
            let notes = match module {
                Some(module) => app
                    .notes
                    .get_notes_by_module(&module)
                    .await
                    .into_iter()
                    .map(|note| (note, None::<String>))
                    .collect::<Vec<_>>(),
                None => app
                    .notes
                    .get_notes_with_details(&catalog.modules)
                    .await
                    .into_iter()
                    .map(|joined| (joined.note, joined.module.map(|m| m.title)))
                    .collect(),
            };
            if notes.is_empty() {
                println!("No notes yet.");
            }
            for (note, title) in notes {
                let body = match note.kind {
                    NoteType::Text => note.content.unwrap_or_default(),
                    NoteType::Audio => format!(
                        "[audio {:.0}s] {}",
                        note.duration.unwrap_or(0.0),
                        note.audio_path.unwrap_or_default()
                    ),
                };
                let title = title.unwrap_or_else(|| note.module_id.clone());
                println!(
                    "{}  {}  {}: {}",
                    note.id,
                    note.created_at.format("%Y-%m-%d %H:%M"),
                    title,
                    body
                );
            }
        }
        NoteCommand::Update { id, text } => {
            validate_text(&text)?;
            let notes = app.notes.update_note(&id, NotePatch::content(text.trim())).await;
            if notes.iter().any(|n| n.id == id) {
                println!("Updated note {}", id);
            } else {
                println!("No note with id {}", id);
            }
        }
        NoteCommand::Delete { id } => {
            let before = app.notes.all_notes().await.len();
            let after = app.notes.delete_note(&id).await.len();
            if after < before {
                println!("Deleted note {}", id);
            } else {
                println!("No note with id {}", id);
            }
        }
    }
    Ok(())
}

async fn playback(app: &AppContext, command: PlaybackCommand) -> Result<()> {
    match command {
        PlaybackCommand::Save {
            module,
            position,
            duration,
        } => {
            let state = app.playback.save_state(&module, position, duration).await;
            println!(
                "Saved {} at {} / {}",
                state.module_id,
                format_time(state.position),
                format_time(state.duration)
            );
        }
        PlaybackCommand::Show { module } => match app.playback.get_state(&module).await {
            Some(state) => println!(
                "{} at {} / {} ({:.0}%), last played {}",
                state.module_id,
                format_time(state.position),
                format_time(state.duration),
                calculate_progress(state.position, state.duration) * 100.0,
                state.last_played.format("%Y-%m-%d %H:%M")
            ),
            None => println!("No saved position for {}", module),
        },
    }
    Ok(())
}
