use async_trait::async_trait;
use serde::Deserialize;

use crate::models::ai_config::AiConfig;
use crate::models::board::{Coord, Stone};
use crate::services::errors::move_suggester_errors::SuggesterError;

#[cfg(test)]
use mockall::automock;

/// Everything a suggester gets to see when choosing a move for one seat.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionRequest {
    pub room_id: String,
    pub board: Vec<Vec<u8>>,
    pub board_size: usize,
    pub win_length: usize,
    pub stone: Stone,
    pub config: AiConfig,
    /// Why the previous proposal in this room failed, fed back so the
    /// suggester can avoid repeating it.
    pub last_error: Option<String>,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait MoveSuggester: Send + Sync {
    async fn suggest_move(&self, request: &SuggestionRequest) -> Result<Coord, SuggesterError>;
}

pub fn build_prompt(request: &SuggestionRequest) -> String {
    let rows: Vec<String> = request
        .board
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| cell.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();

    let mut prompt = format!(
        "You are playing Gomoku on a {size}x{size} board. The first player to get {win} \
         stones in a row horizontally, vertically or diagonally wins.\n\
         The board is listed row by row, 0 is empty, 1 is black, 2 is white:\n{board}\n\
         You are player {seat} ({stone}).\n",
        size = request.board_size,
        win = request.win_length,
        board = rows.join("\n"),
        seat = request.stone.seat_index(),
        stone = request.stone,
    );

    if let Some(error) = request.last_error.as_deref().filter(|e| !e.is_empty()) {
        prompt.push_str(&format!(
            "Your previous attempt failed with: {}. Choose an empty cell inside the board.\n",
            error
        ));
    }
    if !request.config.custom_prompt.trim().is_empty() {
        prompt.push_str(&format!(
            "Additional instructions: {}\n",
            request.config.custom_prompt.trim()
        ));
    }
    prompt.push_str(&format!(
        "Respond only with JSON of the form {{\"x\": row, \"y\": column}} where row and column \
         are integers from 0 to {}.",
        request.board_size.saturating_sub(1)
    ));
    prompt
}

#[derive(Debug, Deserialize)]
struct MovePayload {
    x: i64,
    y: i64,
}

/// Reads a move out of free-form model output. Accepts the first `{"x":..,"y":..}`
/// object in the text, or a bare `(x,y)` pair. `x` is the row.
pub fn parse_move(text: &str) -> Result<Coord, SuggesterError> {
    let payload = match extract_json_object(text) {
        Some(json) => serde_json::from_str::<MovePayload>(json)
            .map_err(|e| SuggesterError::InvalidResponse(format!("{}: {}", e, json)))?,
        None => parse_pair(text).ok_or_else(|| {
            SuggesterError::InvalidResponse(format!("no coordinates in '{}'", text.trim()))
        })?,
    };

    if payload.x < 0 || payload.y < 0 {
        return Err(SuggesterError::IllegalMove(format!(
            "({},{}) is outside the board",
            payload.x, payload.y
        )));
    }
    Ok(Coord::new(payload.x as usize, payload.y as usize))
}

fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = start + text[start..].find('}')?;
    Some(&text[start..=end])
}

fn parse_pair(text: &str) -> Option<MovePayload> {
    let start = text.find('(')?;
    let end = start + text[start..].find(')')?;
    let mut parts = text[start + 1..end].split(',');
    let x = parts.next()?.trim().parse().ok()?;
    let y = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(MovePayload { x, y })
}
