mod ids;
mod path;
mod player;
mod question;
mod session;
mod tree;

pub use ids::{NodeId, ParseIdError, PlayerRecordId};
pub use path::{PathParseError, SelectedPath};
pub use player::{NewPlayerRecord, RemotePlayerRecord, find_by_name};
pub use question::{OPTION_COUNT, QuestionDraft, QuestionError, QuestionRecord};
pub use session::{SessionDraft, SessionState};
pub use tree::{Children, DecisionTree, OPTION_LABELS, TreeError, TreeNode};
