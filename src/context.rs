use std::collections::HashMap;

/// Key-value data collected by the trigger, available to the actions of a pass.
pub type Context = HashMap<String, String>;
