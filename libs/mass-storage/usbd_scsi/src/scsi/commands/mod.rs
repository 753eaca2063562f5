// Vendored from https://github.com/stm32-rs/stm32-usbd tag v0.6.0
// Original copyright (c) 2021 Matti Virkkunen <mvirkkunen@gmail.com>, Vadim Kaushan <admin@disasm.info>,
// Nicolas Stalder <n@stalder.io>", Jonas Martin <lichtfeind@gmail.com>
// SPDX-License-Identifier: MIT
// SPDX-LIcense-Identifier: Apache 2.0

mod command;
pub use command::*;

mod control;
pub use control::*;

mod command_length;
pub use command_length::*;

mod inquiry;
pub use inquiry::*;

mod mode_select;
pub use mode_select::*;

mod format;
pub use format::*;

mod mode_sense;
pub use mode_sense::*;

mod prevent_allow_medium_removal;
pub use prevent_allow_medium_removal::*;

mod read_capacity;
pub use read_capacity::*;

mod read_format_capacities;
pub use read_format_capacities::*;

mod read;
pub use read::*;

mod report_luns;
pub use report_luns::*;

mod request_sense;
pub use request_sense::*;

mod send_diagnostic;
pub use send_diagnostic::*;

mod start_stop_unit;
pub use start_stop_unit::*;

mod synchronize_cache;
pub use synchronize_cache::*;

mod test_unit_ready;
pub use test_unit_ready::*;

mod verify;
pub use verify::*;

mod write;
pub use write::*;

mod mode_parameter;
pub use mode_parameter::*;
