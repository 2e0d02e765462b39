use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(CommandId);

/// A stored how-to: the command line text, what it does, and where it runs.
///
/// `commanline` keeps the historical spelling used by existing clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub id: CommandId,
    pub how_to: String,
    pub commanline: String,
    pub platform: String,
}

impl Command {
    pub fn new(
        id: i64,
        how_to: impl Into<String>,
        commanline: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            id: CommandId(id),
            how_to: how_to.into(),
            commanline: commanline.into(),
            platform: platform.into(),
        }
    }

    /// Overwrites every field except `id`.
    pub fn apply(&mut self, replacement: &Command) {
        self.how_to = replacement.how_to.clone();
        self.commanline = replacement.commanline.clone();
        self.platform = replacement.platform.clone();
    }
}
