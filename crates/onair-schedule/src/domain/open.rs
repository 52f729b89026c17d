//! The open block's script prompt.

use onair_core::generation::GenerationRequest;

/// Host persona for block openings.
pub const ANNOUNCER_DIRECTIVE: &str = "Eres un locutor de radio carismático en español. \
Hablas 1-2 minutos, presentas el bloque y llamas a participar con !pregunta.";

/// The ask for every opening.
pub const OPEN_PROMPT: &str = "Escribe una apertura breve (120-200 palabras) con tono cálido.";

/// Builds the generation request for a block opening.
#[must_use]
pub fn open_request() -> GenerationRequest {
    GenerationRequest::new(ANNOUNCER_DIRECTIVE, OPEN_PROMPT)
}
