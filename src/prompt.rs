use std::io::{self, BufRead, Write};

/// Interactive collection of the run inputs
pub struct Prompter<I, O> {
    input: I,
    output: O,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<I: BufRead, O: Write> Prompter<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self { input, output }
    }

    /// Print `label` and read one trimmed line; end of input reads as empty
    pub fn ask(&mut self, label: &str) -> io::Result<String> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(answer.trim().to_string())
    }

    pub fn read_token(&mut self) -> io::Result<String> {
        writeln!(
            self.output,
            "\n📌 Step 1: Enter your GitHub Personal Access Token"
        )?;
        writeln!(
            self.output,
            "   (Don't have one? Visit: https://github.com/settings/tokens)"
        )?;
        self.ask("\n   Token: ")
    }

    pub fn read_target(&mut self) -> io::Result<String> {
        writeln!(
            self.output,
            "📌 Step 2: Enter the username whose followers you want to follow"
        )?;
        self.ask("\n   Username: ")
    }

    /// Warn about the bulk action and require a literal `yes`
    pub fn confirm(&mut self, target: &str) -> io::Result<bool> {
        writeln!(self.output, "\n⚠️  WARNING:")?;
        writeln!(self.output, "   This will follow ALL followers of '{target}'")?;
        writeln!(
            self.output,
            "   This might take a while depending on how many followers they have."
        )?;
        writeln!(
            self.output,
            "\n   You can press Ctrl+C at any time to stop the bot."
        )?;
        let answer = self.ask("\n   Type 'yes' to continue: ")?;
        Ok(is_confirmation(&answer))
    }
}

pub fn is_confirmation(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}
