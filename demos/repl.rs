use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt};
use funlisp::{Interpreter, Value};

async fn query(stdout: &mut io::Stdout, lines: &mut io::Lines<io::BufReader<io::Stdin>>) -> io::Result<Option<String>> {
    stdout.write_all("> ".as_bytes()).await?;
    stdout.flush().await?;
    lines.next_line().await
}

#[tokio::main]
async fn main() {
    let mut context = Interpreter::new();
    let mut lines = io::BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    // Evaluation is synchronous, only reading the next line is awaited
    while let Ok(Some(line)) = query(&mut stdout, &mut lines).await {
        match context.evaluate_str(&line) {
            Ok(Some(Value::Unit)) | Ok(None) => {}
            Ok(Some(value)) => println!("{}", value),
            Err(err) => println!("Error: {}", err),
        }
    }
}
