//! Gallery module - generates the infinite-scroll HTML page served at `/`.

/// Escape HTML special characters to prevent XSS attacks.
fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

const GALLERY_STYLE: &str = r#"
        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }
        body {
            background: #0f0f0f;
            color: #e5e5e5;
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif;
        }
        header {
            padding: 24px 32px;
            border-bottom: 1px solid #262626;
        }
        header h1 {
            font-size: 20px;
            font-weight: 600;
        }
        #grid {
            display: grid;
            grid-template-columns: repeat(auto-fill, minmax(220px, 1fr));
            gap: 16px;
            padding: 24px 32px;
        }
        .card {
            background: #1a1a1a;
            border-radius: 8px;
            overflow: hidden;
            display: flex;
            flex-direction: column;
        }
        .card img {
            width: 100%;
            aspect-ratio: 1;
            object-fit: cover;
            background: #262626;
        }
        .card .meta {
            display: flex;
            align-items: center;
            justify-content: space-between;
            gap: 8px;
            padding: 8px 12px;
            font-size: 12px;
        }
        .card .name {
            overflow: hidden;
            text-overflow: ellipsis;
            white-space: nowrap;
        }
        .card a {
            color: #60a5fa;
            text-decoration: none;
            flex-shrink: 0;
        }
        #status {
            padding: 0 32px 16px;
            font-size: 13px;
            color: #a3a3a3;
        }
        #progress-bar {
            height: 4px;
            margin-top: 6px;
            background: #262626;
            border-radius: 2px;
            overflow: hidden;
        }
        #progress-fill {
            height: 100%;
            width: 0;
            background: #60a5fa;
            transition: width 0.2s ease;
        }
        #error {
            margin: 0 32px 16px;
            padding: 12px 16px;
            border-radius: 6px;
            background: #450a0a;
            color: #fecaca;
            font-size: 13px;
        }
        #sentinel {
            height: 40px;
        }
        [hidden] {
            display: none !important;
        }
"#;

const GALLERY_SCRIPT: &str = r#"
        const grid = document.getElementById('grid');
        const sentinel = document.getElementById('sentinel');
        const statusBox = document.getElementById('status');
        const statusText = document.getElementById('status-text');
        const progressFill = document.getElementById('progress-fill');
        const errorBox = document.getElementById('error');

        const abort = new AbortController();
        window.addEventListener('pagehide', () => abort.abort());

        let loading = false;
        let hasNextPage = true;
        let continuationToken = null;

        function showProgress(progress) {
            statusBox.hidden = false;
            if (!progress) {
                statusText.textContent = 'Loading images...';
                progressFill.style.width = '0';
                return;
            }
            statusText.textContent = 'Processing images: ' + progress.processed + ' / ' + progress.total;
            const ratio = progress.total > 0 ? progress.processed / progress.total : 1;
            progressFill.style.width = (ratio * 100) + '%';
        }

        function showError(message) {
            errorBox.textContent = message;
            errorBox.hidden = false;
        }

        function downloadHref(image) {
            const params = new URLSearchParams({
                url: image.url,
                fileName: image.fileName || 'image.png',
            });
            return '/api/download?' + params.toString();
        }

        function appendImages(images) {
            for (const image of images) {
                const card = document.createElement('div');
                card.className = 'card';

                const img = document.createElement('img');
                img.src = image.url;
                img.alt = image.fileName;
                img.loading = 'lazy';

                const meta = document.createElement('div');
                meta.className = 'meta';

                const name = document.createElement('span');
                name.className = 'name';
                name.textContent = image.fileName;
                name.title = image.fileName;

                const link = document.createElement('a');
                link.href = downloadHref(image);
                link.textContent = 'Download';

                meta.append(name, link);
                card.append(img, meta);
                grid.append(card);
            }
        }

        function handleEvent(event) {
            switch (event.status) {
                case 'processing':
                    if (event.progress) showProgress(event.progress);
                    return false;
                case 'complete':
                    appendImages(event.images || []);
                    hasNextPage = Boolean(event.hasMore);
                    continuationToken = event.continuationToken || null;
                    return true;
                case 'error':
                    throw new Error(event.error || 'Unknown error occurred');
                default:
                    return false;
            }
        }

        function handleLine(line) {
            if (!line.trim()) return false;
            let event;
            try {
                event = JSON.parse(line);
            } catch (err) {
                console.error('Skipping malformed line', err);
                return false;
            }
            return handleEvent(event);
        }

        async function loadMore() {
            if (loading || !hasNextPage) return;
            loading = true;
            errorBox.hidden = true;
            showProgress(null);

            try {
                const url = new URL('/api/images', window.location.origin);
                if (continuationToken) url.searchParams.set('continuationToken', continuationToken);

                const response = await fetch(url, { signal: abort.signal });
                if (!response.ok) {
                    throw new Error('Network response was not ok (status ' + response.status + ')');
                }

                const reader = response.body.getReader();
                const decoder = new TextDecoder();
                let buffer = '';
                let completed = false;

                while (!completed) {
                    const { done, value } = await reader.read();
                    buffer += done ? decoder.decode() : decoder.decode(value, { stream: true });

                    const lines = buffer.split('\n');
                    buffer = done ? '' : lines.pop();

                    for (const line of lines) {
                        if (handleLine(line)) {
                            completed = true;
                            break;
                        }
                    }
                    if (done) break;
                }

                if (completed) {
                    reader.cancel().catch(() => {});
                } else {
                    throw new Error('Stream ended before the page completed');
                }
            } catch (err) {
                showError(err.name === 'AbortError' ? 'Request was cancelled' : err.message);
            } finally {
                loading = false;
                statusBox.hidden = true;
                if (hasNextPage && errorBox.hidden) {
                    observer.unobserve(sentinel);
                    observer.observe(sentinel);
                }
            }
        }

        const observer = new IntersectionObserver((entries) => {
            if (entries.some((entry) => entry.isIntersecting)) loadMore();
        }, { rootMargin: '400px' });

        observer.observe(sentinel);
"#;

/// Generate the gallery page.
///
/// The page pulls `/api/images` as NDJSON whenever the sentinel below the grid
/// comes within 400px of the viewport, and links every image to
/// `/api/download`.
pub fn generate_gallery_html(title: &str) -> String {
    let escaped_title = html_escape(title);

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{escaped_title}</title>
    <style>{GALLERY_STYLE}</style>
</head>
<body>
    <header>
        <h1>{escaped_title}</h1>
    </header>
    <main>
        <div id="grid"></div>
        <div id="error" role="alert" hidden></div>
        <div id="status" hidden>
            <span id="status-text">Loading images...</span>
            <div id="progress-bar"><div id="progress-fill"></div></div>
        </div>
        <div id="sentinel"></div>
    </main>
    <script>{GALLERY_SCRIPT}</script>
</body>
</html>
"##
    )
}
