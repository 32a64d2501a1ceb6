/// Shared formatting helpers (badge text, plurals, speeds).
pub mod formatting;
/// HTML escaping used by the renderers.
pub mod html;
/// Single source of truth for the terminal command prefix.
pub const COMMAND_PREFIX: char = '/';
