mod entry;
mod helpers;
mod report;

pub(crate) use entry::{EntryEdit, cmd_add, cmd_add_json, cmd_delete, cmd_edit};
pub(crate) use helpers::{parse_date, store_failure};
pub(crate) use report::{cmd_category, cmd_chart, cmd_list};
