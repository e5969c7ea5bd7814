use routeprobe_display::ProgressLine;
use routeprobe_domain::ConsoleWriter;

/// Convenience printing on top of [`ConsoleWriter`].
///
/// Output errors are dropped; a closed terminal must not abort a run.
pub trait ConsoleExt: ConsoleWriter {
    fn print(&self, text: impl AsRef<str>) {
        let _ = self.write(text.as_ref().as_bytes());
        let _ = self.flush();
    }

    fn println(&self, text: impl AsRef<str>) {
        self.print(format!("{}\n", text.as_ref()));
    }

    fn progress(&self, line: ProgressLine) {
        self.println(line.to_string());
    }
}

impl<T: ConsoleWriter + ?Sized> ConsoleExt for T {}
