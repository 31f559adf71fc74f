//! Shared primitive aliases and well-known names.

/// Key string under which a drill is stored in the table.
pub type DrillKey = String;

/// Delimiter joining the fields of a [`DrillKey`].
pub const KEY_SEPARATOR: &str = "|+|";

/// File name of the canonical drill table inside the documents directory.
pub const DRILLS_FILE_NAME: &str = "CycleMusicTimerDrills.cmt";

/// Legacy encoding of a set scope flag.
pub const SCOPE_YES: &str = "YES";
/// Legacy encoding of a cleared scope flag.
pub const SCOPE_NO: &str = "NO";
