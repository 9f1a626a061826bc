// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Panic hook reporting fatal errors through the log sink.

use std::panic::{self, PanicHookInfo};
use std::sync::Once;

static INSTALL: Once = Once::new();

/// Chains a panic hook that logs the panic location and message at `error`
/// level before running the previous hook. Installing more than once has no
/// further effect.
pub fn install_fatal_hook() {
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            log::error!("Fatal error at {}: {}", location(info), message(info));
            previous(info);
        }));
    });
}

fn location(info: &PanicHookInfo<'_>) -> String {
    info.location()
        .map(|location| format!("{}:{}", location.file(), location.line()))
        .unwrap_or_else(|| "<unknown>".to_string())
}

fn message<'a>(info: &'a PanicHookInfo<'_>) -> &'a str {
    if let Some(message) = info.payload().downcast_ref::<&str>() {
        message
    } else if let Some(message) = info.payload().downcast_ref::<String>() {
        message
    } else {
        "<non-string payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_chains_and_panics_still_unwind() {
        install_fatal_hook();
        install_fatal_hook();
        let result: std::thread::Result<()> =
            panic::catch_unwind(|| orion_core::fatal!("Buffer {} out of range", 3));
        let payload = result.unwrap_err();
        assert_eq!(
            payload.downcast_ref::<String>().map(String::as_str),
            Some("Buffer 3 out of range")
        );
    }
}
