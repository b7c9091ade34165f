pub mod calendar;
pub mod note;
pub mod todo;

pub use calendar::{CalendarEvent, DayColor, EventEntry, EventStyle};
pub use note::{NoteKey, NoteKeyError, NotesScope, NOTES_PREFIX};
pub use todo::TodoItem;
