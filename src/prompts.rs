//! The instruction template sent to the VLM with every diary photo.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth**: the prompt is a contract on the note schema
//!    (front-matter fields, linking rules), so its wording changes in exactly
//!    one place.
//!
//! 2. **Testability**: unit tests can assert the contract clauses are present
//!    without spinning up a real VLM.
//!
//! The template is parameter-free. The photo travels alongside it as an
//! image attachment; nothing is ever interpolated into the text.

/// Instruction template for converting a diary-page photo to an Obsidian note.
///
/// Sent verbatim as the text part of the single user message; the image part
/// carries the photo. The pipeline composes this request faithfully but
/// cannot verify the model obeyed it — the sanitizer downstream only fixes
/// incidental formatting, never schema violations.
pub const DIARY_NOTE_PROMPT: &str = r###"You are an expert transcriber of handwritten diaries. The input is a photograph of a handwritten diary entry, written in any language.

Follow these rules precisely:

1. TRANSCRIPTION
   - Transcribe the text from the image exactly as written
   - Preserve all punctuation, spacing, and line breaks
   - Do not change, add, or remove any words or punctuation
   - Keep the language of the handwriting; never translate

2. YAML FRONT MATTER
   Begin the note with exactly this block:
   ---
   created: {ISO 8601 date/time at which the entry was physically written.
             If the recorded hour mentions "am" (after midnight),
             attribute it to the next calendar day.}
   date: {ISO 8601 date the entry's content corresponds to}
   tags:
     - note
     - journal
   place: "[[{location where the entry was written}]]"
   ---

3. SECTION HEADERS
   - Insert "## {Header}" lines to separate relevant sections
   - These headers may not exist in the original diary text; create them
     where appropriate
   - Never alter or remove original text when inserting them

4. INTERNAL LINKS
   - Convert any references to:
     - dates
     - person names
     - movies, books, music
     into [[InternalLink]] format
   - If a reference is repeated, link it consistently each time

5. OUTPUT FORMAT
   - Return ONLY the final note: front matter, inserted headers, linked text
   - No additional text or explanation before or after the note"###;
