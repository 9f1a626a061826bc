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

//! The engine's abort-with-message primitive.
//!
//! Contract violations (bounds overruns, double mappings, duplicate
//! registrations, type mismatches, failed asset loads) are programming or
//! content errors, never runtime conditions to recover from. They are
//! reported through [`fatal!`], which writes the message to the log sink and
//! then panics. Hosts decide what a panic means (abort, dialog, debugger
//! trap) by installing a panic hook.

/// Logs a formatted message at error level and panics with it.
///
/// The expression has type `!` and can be used in any position.
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)+) => {{
        let message = ::std::format!($($arg)+);
        $crate::__private::log::error!("fatal: {}", message);
        ::std::panic!("{}", message)
    }};
}

/// Asserts a condition, reporting a violation through [`fatal!`].
///
/// Without a message, the stringified condition is reported.
#[macro_export]
macro_rules! check {
    ($cond:expr $(,)?) => {
        if !$cond {
            $crate::fatal!("Check failed: {}", ::std::stringify!($cond));
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            $crate::fatal!($($arg)+);
        }
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn check_passes_on_true_condition() {
        let width = 4;
        check!(width > 0);
        check!(width == 4, "width is {}", width);
    }

    #[test]
    #[should_panic(expected = "Check failed: width > 0")]
    fn check_reports_condition() {
        let width = 0;
        check!(width > 0);
    }

    #[test]
    #[should_panic(expected = "Texture width must be non-zero (got 0)")]
    fn check_reports_formatted_message() {
        let width = 0;
        check!(width > 0, "Texture width must be non-zero (got {})", width);
    }
}
