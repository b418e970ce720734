//! Server-rendered HTML for the task page.
//!
//! Every control posts to a route that names both the action and the task id,
//! so the handler receives an explicit [`shared::protocol::Event`].

use std::fmt::Write as _;

use shared::{domain::MAX_TITLE_CHARS, protocol::TaskView};

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:0;background:#f5f7fa;color:#2c3e50}\
header{border-bottom:2px solid #dee2e6;padding:1rem 2rem}\
main{display:flex;gap:2rem;padding:2rem}\
aside{width:18rem}\
section{flex:1;border-left:2px solid #2c3e50;padding-left:2rem}\
input[type=text]{width:100%;padding:.5rem;box-sizing:border-box}\
button{padding:.4rem .8rem;margin-top:.5rem;border:0;border-radius:4px;cursor:pointer}\
.add{background:#2c3e50;color:#fff}\
.delete{background:#e74c3c;color:#fff}\
.toggle{background:#f39c12;color:#fff;margin-left:.75rem}\
.cards{display:flex;gap:1rem}\
.card{flex:1;background:#fff;border-radius:4px;overflow:hidden}\
.card h6{margin:0;padding:.5rem 1rem;color:#fff}\
.card p{margin:0;padding:1rem;font-size:2.5rem}\
.total h6{background:#2c3e50}\
.active h6{background:#f39c12}\
table{width:100%;border-collapse:collapse;background:#fff}\
th,td{border:1px solid #dee2e6;padding:.5rem;text-align:left}\
td form{display:inline}";

// Reloads on change notices, but holds off while the title input has text
// and reloads once it is cleared.
const LIVE_RELOAD: &str = "\
(function(){\
var input=document.getElementById('add_input');\
var pending=false;\
function typing(){return input!==null&&input.value.trim()!=='';}\
var proto=location.protocol==='https:'?'wss:':'ws:';\
var ws=new WebSocket(proto+'//'+location.host+'/ws');\
ws.onmessage=function(){if(typing()){pending=true;}else{location.reload();}};\
if(input!==null){input.addEventListener('input',function(){if(pending&&!typing()){location.reload();}});}\
})();";

pub fn render_page(view: &TaskView) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">");
    html.push_str("<title>Task list</title><style>");
    html.push_str(STYLE);
    html.push_str("</style></head><body>");
    html.push_str("<header><h1>Task list</h1></header><main>");

    let _ = write!(
        html,
        "<aside><h5>New task</h5>\
         <form method=\"post\" action=\"/tasks\">\
         <input type=\"text\" id=\"add_input\" name=\"title\" value=\"{}\" maxlength=\"{MAX_TITLE_CHARS}\" \
         placeholder=\"Add a new task\" autofocus>\
         <button class=\"add\" type=\"submit\">Add</button></form></aside>",
        escape_html(&view.input)
    );

    html.push_str("<section><div class=\"cards\">");
    let _ = write!(
        html,
        "<div class=\"card total\"><h6>Total tasks</h6><p id=\"card_total\">{}</p></div>\
         <div class=\"card active\"><h6>Active tasks</h6><p id=\"card_active\">{}</p></div>",
        view.total, view.active
    );
    html.push_str("</div><h5>Tasks</h5>");
    render_table(&mut html, view);
    html.push_str("</section></main><script>");
    html.push_str(LIVE_RELOAD);
    html.push_str("</script></body></html>");
    html
}

fn render_table(html: &mut String, view: &TaskView) {
    html.push_str(
        "<table id=\"task_list\"><thead><tr>\
         <th>ID</th><th>Task</th><th>Status</th><th>Action</th>\
         </tr></thead><tbody>",
    );
    for row in &view.rows {
        let id = row.id.0;
        let _ = write!(
            html,
            "<tr><td>{id}</td><td>{}</td><td>{}</td><td>\
             <form method=\"post\" action=\"/tasks/{id}/delete\">\
             <button class=\"delete\" type=\"submit\">Delete</button></form>\
             <form method=\"post\" action=\"/tasks/{id}/toggle\">\
             <button class=\"toggle\" type=\"submit\">Toggle status</button></form>\
             </td></tr>",
            escape_html(&row.title),
            row.status
        );
    }
    html.push_str("</tbody></table>");
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
