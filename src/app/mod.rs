pub mod attachment_sync_use_case;
pub mod diagnostics;
pub mod ports;
pub mod source_nodes_use_case;
