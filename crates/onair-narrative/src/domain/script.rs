//! Chapter prompt construction.

use onair_core::generation::GenerationRequest;

/// Title of the running serial.
pub const SERIES_TITLE: &str = "Sombras en la Ciudad";

/// Continuity and style directive given with every chapter.
pub const SCREENWRITER_DIRECTIVE: &str = "Eres guionista de una radionovela en español. \
Crea un capítulo por entregas, narración en 2-3 minutos, termina con un cliffhanger. \
Mantén continuidad de personajes. Evita violencia gráfica o temas sensibles. \
Formato: narración continua en primera o tercera persona.";

/// Builds the generation request for `chapter`.
#[must_use]
pub fn chapter_request(chapter: u32) -> GenerationRequest {
    GenerationRequest::new(
        SCREENWRITER_DIRECTIVE,
        format!("Escribe el capítulo {chapter} de la radionovela \"{SERIES_TITLE}\" (300-450 palabras)."),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_request_names_chapter_and_series() {
        let request = chapter_request(12);

        assert!(request.user_prompt.contains("capítulo 12"));
        assert!(request.user_prompt.contains(SERIES_TITLE));
        assert_eq!(request.system_directive, SCREENWRITER_DIRECTIVE);
    }
}
