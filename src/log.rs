#[doc(hidden)]
#[macro_export]
macro_rules! __tagged {
    (out, $tag:literal, $style:expr, $($arg:tt)+) => {
        {
            use owo_colors::OwoColorize;

            println!(
                "{}: {}",
                $tag.if_supports_color(owo_colors::Stream::Stdout, |s| s.style($style)),
                format_args!($($arg)+)
            );
        }
    };
    (err, $tag:literal, $style:expr, $($arg:tt)+) => {
        {
            use owo_colors::OwoColorize;

            eprintln!(
                "{}: {}",
                $tag.if_supports_color(owo_colors::Stream::Stderr, |s| s.style($style)),
                format_args!($($arg)+)
            );
        }
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => {
        $crate::__tagged!(err, "error", owo_colors::Style::new().bold().red(), $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => {
        $crate::__tagged!(out, "warning", owo_colors::Style::new().bold().yellow(), $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => {
        $crate::__tagged!(out, "info", owo_colors::Style::new().bold().green(), $($arg)+)
    };
}

/// Progress line for one stage of a run, e.g. `[3/6] Copying template`
#[macro_export]
macro_rules! step {
    ($n:expr, $total:expr, $($arg:tt)+) => {
        {
            use owo_colors::OwoColorize;

            println!(
                "{} {}",
                format!("[{}/{}]", $n, $total)
                    .if_supports_color(owo_colors::Stream::Stdout, |s| s.style(owo_colors::Style::new().bold().cyan())),
                format_args!($($arg)+)
            );
        }
    };
}

/// Only prints when `PYSEED_TRACE` is set
#[macro_export]
macro_rules! trace {
    ($($arg:tt)+) => {
        if std::env::var_os("PYSEED_TRACE").is_some() {
            $crate::__tagged!(out, "trace", owo_colors::Style::new().bold(), $($arg)+)
        }
    };
}
