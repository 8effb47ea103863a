use axum::{response::Html, routing::get, Router};

pub fn router() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>CrediTrust Consumer Intelligence Bot</title>
  <style>
    body { font-family: Arial, sans-serif; margin: 2rem auto; max-width: 52rem; color: #1d1d1f; }
    h1 { margin-bottom: 0.25rem; }
    .card { border: 1px solid #ddd; padding: 1rem; border-radius: 8px; margin-bottom: 1rem; }
    .msg { white-space: pre-wrap; margin: 0.75rem 0; }
    .user { font-weight: 600; }
    .examples button { margin: 0.25rem 0.5rem 0.25rem 0; }
    textarea { width: 100%; padding: 0.5rem; box-sizing: border-box; }
    button { margin-top: 0.5rem; padding: 0.6rem 1rem; }
  </style>
</head>
<body>
  <h1>&#x1F6E1;&#xFE0F; CrediTrust Consumer Intelligence Bot</h1>
  <p id="description">Analyze thousands of consumer complaints in real-time.</p>

  <div class="card" id="history"></div>

  <div class="card">
    <textarea id="question" rows="3" placeholder="Ask about consumer complaints"></textarea>
    <button id="askBtn">Submit</button>
    <div class="examples" id="examples"></div>
  </div>

  <script>
    const history = document.getElementById('history');
    const question = document.getElementById('question');
    const askBtn = document.getElementById('askBtn');

    function append(cls, text) {
      const div = document.createElement('div');
      div.className = 'msg ' + cls;
      div.textContent = text;
      history.appendChild(div);
      return div;
    }

    async function ask(text) {
      if (!text.trim()) return;
      append('user', text);
      question.value = '';
      const pending = append('bot', 'Searching complaints...');
      askBtn.disabled = true;
      try {
        const res = await fetch('/api/chat', {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify({ message: text })
        });
        const json = await res.json();
        pending.textContent = res.ok ? json.text : 'Error: ' + json.error;
      } catch (err) {
        pending.textContent = 'Error: ' + err;
      } finally {
        askBtn.disabled = false;
      }
    }

    askBtn.addEventListener('click', () => ask(question.value));

    fetch('/api/examples').then(r => r.json()).then(json => {
      const box = document.getElementById('examples');
      for (const example of json.examples) {
        const btn = document.createElement('button');
        btn.textContent = example;
        btn.addEventListener('click', () => ask(example));
        box.appendChild(btn);
      }
    });
  </script>
</body>
</html>"#)
}
