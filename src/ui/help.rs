use crate::app::App;
use crate::store::KeyValueStore;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const FEED_KEYS: &[(&str, &str)] = &[
    ("Tab / 1 2 3", "Articles, avis de décès, favoris"),
    ("j / k", "Descendre / monter"),
    ("/", "Chercher dans les titres"),
    ("f", "Ajouter / retirer des favoris"),
    ("Entrée", "Lire l'article"),
    ("o", "Ouvrir dans le navigateur"),
    ("r", "Recharger les flux"),
    ("q", "Quitter"),
];

const READER_KEYS: &[(&str, &str)] = &[
    ("b / Échap", "Retour à la liste"),
    ("j / k, PgUp / PgDn", "Défiler"),
    ("n / p", "Lien suivant / précédent"),
    ("Entrée", "Suivre le lien"),
    ("o", "Ouvrir l'article dans le navigateur"),
];

/// Render the help overlay centered on screen.
pub fn render<S: KeyValueStore + Clone>(f: &mut Frame, _app: &App<S>) {
    let area = f.area();

    let heading = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let mut lines = vec![Line::from(Span::styled("Liste", heading))];
    lines.extend(FEED_KEYS.iter().map(|(k, d)| key_line(k, d)));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Lecture", heading)));
    lines.extend(READER_KEYS.iter().map(|(k, d)| key_line(k, d)));

    let width = 60u16.min(area.width.saturating_sub(4));
    let height = (lines.len() as u16 + 2).min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay = Rect::new(x, y, width, height);

    if overlay.width < 20 || overlay.height < 5 {
        return;
    }

    f.render_widget(Clear, overlay);
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Aide (une touche pour fermer) "),
    );
    f.render_widget(paragraph, overlay);
}

fn key_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:>20}  ", key), Style::default().fg(Color::Yellow)),
        Span::raw(desc),
    ])
}
