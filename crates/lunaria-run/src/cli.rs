use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use itertools::Itertools;
use lunaria_lang::{BUILTIN_HANDLER_DOC, Compiler, CompilerConfig};
use miette::{IntoDiagnostic, NamedSource, miette};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "lunaria")]
#[command(author, version)]
#[command(after_help = "Examples:\n\n\
    To compile a file and print the Luau code:\n\
    $ lunaria script.xml\n\n\
    To read from stdin:\n\
    $ cat script.xml | lunaria -\n\n\
    To write the result to a file:\n\
    $ lunaria script.xml -o build/script.lua\n\n\
    To compile every file matching a pattern:\n\
    $ lunaria batch 'src/**/*.xml'")]
#[command(
    about = "Lunaria compiles XML markup into Luau source code.",
    long_about = None
)]
pub struct Cli {
    #[clap(subcommand)]
    commands: Option<Commands>,

    #[command(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity,

    /// Number of spaces per indentation level
    #[arg(long, default_value_t = 4, global = true)]
    indent_width: usize,

    /// Output to the specified file
    #[clap(short = 'o', long = "output", value_name = "FILE")]
    output_file: Option<PathBuf>,

    /// XML file to compile, use '-' to read from stdin
    file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compile every .xml and .lunaria file matching a glob pattern to a sibling .lua file
    Batch {
        /// Glob pattern such as 'scripts/**/*.xml'
        pattern: String,
    },
    /// Show usage examples together with the generated code
    Examples,
    /// List the built-in tags and their attributes
    Tags,
}

struct Example {
    title: &'static str,
    description: &'static str,
    source: &'static str,
}

const EXAMPLES: &[Example] = &[
    Example {
        title: "Basic Variables and Output",
        description: "Simple variable assignment and string interpolation",
        source: r#"<script>
  <set var="name" local="true">"World"</set>
  <set var="version" local="true">1.0</set>
  <print>Hello, {{name}}! Version: {{version}}</print>
</script>"#,
    },
    Example {
        title: "Control Flow",
        description: "Conditionals and loops",
        source: r#"<script>
  <set var="max" local="true">5</set>
  <for var="i" from="1" to="max">
    <if test="i % 2 == 0">
      <print>{{i}} is even</print>
    <else>
      <print>{{i}} is odd</print>
    </else>
    </if>
  </for>
</script>"#,
    },
    Example {
        title: "Functions and Tables",
        description: "Function definitions and table creation",
        source: r#"<script>
  <function name="calculateArea" params="width, height" local="true">
    <return>width * height</return>
  </function>

  <table var="rectangle" local="true">
    <entry key="width">10</entry>
    <entry key="height">20</entry>
    <entry key="area">calculateArea(10, 20)</entry>
  </table>

  <print>Area: {{rectangle.area}}</print>
</script>"#,
    },
    Example {
        title: "Error Handling",
        description: "Assertions and error handling",
        source: r#"<script>
  <function name="divide" params="a, b" local="true">
    <assert test="b ~= 0">Cannot divide by zero</assert>
    <return>a / b</return>
  </function>

  <set var="result" local="true">divide(10, 2)</set>
  <print>Result: {{result}}</print>
</script>"#,
    },
    Example {
        title: "Mixed Raw Code",
        description: "Combining XML commands with raw Luau",
        source: r#"<script>
  <comment>Custom math utilities</comment>
  <raw>
local function clamp(value, min, max)
    return math.max(min, math.min(max, value))
end
  </raw>

  <set var="value" local="true">clamp(15, 0, 10)</set>
  <print>Clamped value: {{value}}</print>
</script>"#,
    },
];

impl Cli {
    pub fn run(&self) -> miette::Result<()> {
        match &self.commands {
            Some(Commands::Batch { pattern }) => self.batch(pattern),
            Some(Commands::Examples) => {
                self.examples();
                Ok(())
            }
            Some(Commands::Tags) => {
                Self::tags();
                Ok(())
            }
            None => match &self.file {
                Some(file) => self.compile_file(file),
                None => Cli::command().print_help().into_diagnostic(),
            },
        }
    }

    fn compiler(&self) -> Compiler {
        Compiler::with_config(CompilerConfig {
            indent_width: self.indent_width,
            ..Default::default()
        })
    }

    fn compile_file(&self, file: &Path) -> miette::Result<()> {
        let (name, source) = read_input(file)?;
        let code = self.compiler().compile_str(&source).map_err(|e| {
            miette::Report::new(e).with_source_code(NamedSource::new(&name, source.clone()))
        })?;

        match &self.output_file {
            Some(output) => {
                write_output(output, &code)?;
                println!(
                    "{} {} -> {}",
                    "Compiled".green().bold(),
                    name,
                    output.display()
                );
            }
            None => println!("{code}"),
        }

        Ok(())
    }

    fn batch(&self, pattern: &str) -> miette::Result<()> {
        let files = glob::glob(pattern)
            .into_diagnostic()?
            .collect::<Result<Vec<_>, _>>()
            .into_diagnostic()?;

        if files.is_empty() {
            return Err(miette!("no files match pattern: {}", pattern));
        }

        let mut compiler = self.compiler();
        let mut failed = 0;
        let targets = files.iter().filter(|file| is_lunaria_file(file)).collect_vec();

        log::debug!("{} of {} matched files are Lunaria sources", targets.len(), files.len());

        for file in &targets {
            print!("Compiling {}...", file.display());

            let output = file.with_extension("lua");
            let result = fs::read_to_string(file)
                .map_err(|e| e.to_string())
                .and_then(|source| compiler.compile_str(&source).map_err(|e| e.to_string()))
                .and_then(|code| write_output(&output, &code).map_err(|e| e.to_string()));

            match result {
                Ok(()) => println!(" -> {}", output.display().to_string().green()),
                Err(e) => {
                    failed += 1;
                    println!(" {} {}", "ERROR:".red().bold(), e);
                }
            }
        }

        if failed > 0 {
            return Err(miette!("{} of {} files failed to compile", failed, targets.len()));
        }

        Ok(())
    }

    fn examples(&self) {
        println!("{}", "Lunaria Examples".bold());
        println!("================");
        println!();

        let mut compiler = self.compiler();

        for (i, example) in EXAMPLES.iter().enumerate() {
            println!("{}. {}", i + 1, example.title.bold());
            println!("   {}\n", example.description);
            println!("   XML:");
            print_indented(example.source, "   ");
            println!();

            match compiler.compile_str(example.source) {
                Ok(code) => {
                    println!("   Compiles to:");
                    print_indented(&code, "   ");
                }
                Err(e) => println!("   {} {}", "Error:".red(), e),
            }

            println!();
            println!("{}", "-".repeat(60));
            println!();
        }
    }

    fn tags() {
        for (tag, doc) in BUILTIN_HANDLER_DOC.iter().sorted_by(|(a, _), (b, _)| a.cmp(b)) {
            let attributes = if doc.attributes.is_empty() {
                "-".to_string()
            } else {
                doc.attributes.join(", ")
            };

            println!(
                "{} {:<26} {}",
                format!("{:<10}", format!("<{tag}>")).cyan(),
                attributes,
                doc.description
            );
        }
    }
}

/// Reads `file`, or stdin when it is `-`, returning a display name and the contents.
fn read_input(file: &Path) -> miette::Result<(String, String)> {
    if file == Path::new("-") {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source).into_diagnostic()?;
        return Ok(("<stdin>".to_string(), source));
    }

    if !file.exists() {
        return Err(miette!("File not found: {}", file.display()));
    }

    let source = fs::read_to_string(file).into_diagnostic()?;
    Ok((file.display().to_string(), source))
}

fn write_output(path: &Path, code: &str) -> miette::Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).into_diagnostic()?;
    }

    fs::write(path, format!("{code}\n")).into_diagnostic()
}

fn is_lunaria_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml") || ext.eq_ignore_ascii_case("lunaria"))
}

fn print_indented(text: &str, indent: &str) {
    for line in text.lines() {
        if line.trim().is_empty() {
            println!();
        } else {
            println!("{indent}{line}");
        }
    }
}
